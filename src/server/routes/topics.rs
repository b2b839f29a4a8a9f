use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::NewTopic;
use crate::server::guards::RequireAdminKey;
use crate::server::respond::ok;
use crate::server::router::AppState;

/// Either structured topics or raw `topic | keyword, keyword` lines.
#[derive(Debug, Deserialize)]
pub struct ImportTopics {
    #[serde(default)]
    pub topics: Vec<NewTopic>,
    #[serde(default)]
    pub lines: Option<String>,
}

pub async fn list_topics(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let repository = &state.app.repository;
    let topics = repository.list_topics().await?;
    let stats = repository.topic_stats().await?;
    Ok(ok(json!({ "topics": topics, "stats": stats })))
}

pub async fn add_topic(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Json(topic): Json<NewTopic>,
) -> Result<impl IntoResponse> {
    if topic.topic.trim().is_empty() {
        return Err(AppError::BadRequest("topic is required".to_string()));
    }
    let topic = NewTopic::new(topic.topic.trim(), topic.keywords.as_deref().map(str::trim));
    let id = state.app.repository.insert_topic(topic).await?;
    Ok(ok(json!({ "id": id })))
}

pub async fn import_topics(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Json(body): Json<ImportTopics>,
) -> Result<impl IntoResponse> {
    let mut topics: Vec<NewTopic> = body
        .topics
        .into_iter()
        .filter(|t| !t.topic.trim().is_empty())
        .collect();
    if let Some(lines) = &body.lines {
        topics.extend(lines.lines().filter_map(NewTopic::from_line));
    }

    let (added, skipped) = state.app.repository.import_topics(topics).await?;
    tracing::info!("Imported topics: {} added, {} skipped", added, skipped);
    Ok(ok(json!({ "added": added, "skipped": skipped })))
}

pub async fn reset_topics(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let reset = state.app.repository.reset_all_topics().await?;
    tracing::info!("Reset {} topics", reset);
    Ok(ok(json!({ "reset": reset })))
}

pub async fn delete_topic(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    if !state.app.repository.delete_topic(id).await? {
        return Err(AppError::NotFound(format!("topic {}", id)));
    }
    Ok(ok(json!({ "id": id })))
}
