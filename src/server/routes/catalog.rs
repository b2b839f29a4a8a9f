use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::error::Result;
use crate::models::{NewGalleryImage, NewProduct};
use crate::server::guards::RequireAdminKey;
use crate::server::respond::ok;
use crate::server::router::AppState;

pub async fn list_images(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(ok(state.app.catalog.list_images().await?))
}

pub async fn add_image(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Json(image): Json<NewGalleryImage>,
) -> Result<impl IntoResponse> {
    let id = state.app.catalog.add_image(image).await?;
    Ok(ok(json!({ "id": id })))
}

pub async fn delete_image(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> Result<impl IntoResponse> {
    state.app.catalog.delete_image(&media_id).await?;
    Ok(ok(json!({ "media_id": media_id })))
}

pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(ok(state.app.catalog.list_products().await?))
}

pub async fn add_product(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Json(product): Json<NewProduct>,
) -> Result<impl IntoResponse> {
    Ok(ok(state.app.catalog.add_product(product).await?))
}

pub async fn delete_product(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.app.catalog.delete_product(id).await?;
    Ok(ok(json!({ "id": id })))
}
