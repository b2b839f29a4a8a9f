use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::routes::{agent, catalog, posts, topics};
use crate::app::App;

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<App>,
}

impl AppState {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// One log line per request, tagged with a request id that is echoed back to the client.
async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

    let start = Instant::now();
    let mut resp = next.run(req).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status().as_u16();
    match status {
        500.. => error!(%method, %path, status, elapsed_ms, %request_id, "request failed"),
        400..=499 => warn!(%method, %path, status, elapsed_ms, %request_id, "request rejected"),
        _ => info!(%method, %path, status, elapsed_ms, %request_id, "request served"),
    }
    resp
}

pub fn router(state: AppState) -> Router {
    // Writes on these paths are gated per handler by `RequireAdminKey`.
    let site = Router::new()
        .route("/api/images", get(catalog::list_images).post(catalog::add_image))
        .route("/api/images/{media_id}", delete(catalog::delete_image))
        .route("/api/products", get(catalog::list_products).post(catalog::add_product))
        .route("/api/products/{id}", delete(catalog::delete_product))
        .route("/api/posts", get(posts::list_published).post(posts::create_post))
        .route(
            "/api/posts/{id}",
            get(posts::view_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/api/cron/generate", post(agent::cron_generate));

    let admin = Router::new()
        .route("/api/admin/posts", get(posts::list_all))
        .route("/api/admin/topics", get(topics::list_topics).post(topics::add_topic))
        .route("/api/admin/topics/import", post(topics::import_topics))
        .route("/api/admin/topics/reset", post(topics::reset_topics))
        .route("/api/admin/topics/{id}", delete(topics::delete_topic))
        .route("/api/admin/generate", post(agent::generate_now))
        .route("/api/admin/agent", get(agent::status).put(agent::update));

    Router::new()
        .merge(site)
        .merge(admin)
        .fallback(not_found_handler)
        .with_state(state)
        .layer(middleware::from_fn(access_log))
}
