use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use crate::agent::Trigger;
use crate::error::Result;
use crate::server::guards::{RequireAdminKey, RequireCronSecret};
use crate::server::respond::ok;
use crate::server::router::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateAgent {
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub schedule_time: Option<String>,
}

pub async fn cron_generate(
    _cron: RequireCronSecret,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ok(state.app.scheduler.run_now(Trigger::External).await)
}

pub async fn generate_now(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ok(state.app.scheduler.run_now(Trigger::Manual).await)
}

pub async fn status(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(ok(state.app.scheduler.status().await?))
}

pub async fn update(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Json(body): Json<UpdateAgent>,
) -> Result<impl IntoResponse> {
    let scheduler = &state.app.scheduler;
    scheduler
        .update_config(body.is_enabled, body.schedule_time.as_deref())
        .await?;
    Ok(ok(scheduler.status().await?))
}
