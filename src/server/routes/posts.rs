use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::error::Result;
use crate::models::{NewPost, PostUpdate};
use crate::server::guards::{ClientIp, RequireAdminKey};
use crate::server::respond::ok;
use crate::server::router::AppState;

/// Admin-written post; the author defaults to the configured site author.
#[derive(Debug, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

pub async fn list_published(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(ok(state.app.blog.list_posts(true).await?))
}

pub async fn list_all(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(ok(state.app.blog.list_posts(false).await?))
}

pub async fn view_post(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    Ok(ok(state.app.blog.view_post(id, &ip).await?))
}

pub async fn create_post(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Json(body): Json<CreatePost>,
) -> Result<impl IntoResponse> {
    let post = NewPost {
        title: body.title,
        content: body.content,
        summary: body.summary,
        thumbnail: body.thumbnail,
        topic_id: None,
        author: body
            .author
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| state.app.config.author.clone()),
        published: body.published.unwrap_or(true),
    };
    Ok(ok(state.app.blog.create_post(post).await?))
}

pub async fn update_post(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<PostUpdate>,
) -> Result<impl IntoResponse> {
    Ok(ok(state.app.blog.update_post(id, update).await?))
}

pub async fn delete_post(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    Ok(ok(state.app.blog.delete_post(id).await?))
}
