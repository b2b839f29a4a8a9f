use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::server::router::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

fn header_token(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn query_token(query: Option<&str>, name: &str) -> Option<String> {
    query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    })
}

fn check(presented: Option<String>, expected: Option<&str>) -> Result<(), AuthError> {
    let expected = expected.ok_or(AuthError::NotConfigured)?;
    let presented = presented.ok_or(AuthError::MissingKey)?;
    if presented.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(AuthError::InvalidKey)
    }
}

/// Admin routes: `x-admin-key` header or a bearer token.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdminKey;

impl FromRequestParts<AppState> for RequireAdminKey {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = header_token(&parts.headers, "x-admin-key").or_else(|| bearer_token(&parts.headers));
        check(token, state.app.config.admin_key.as_deref())?;
        Ok(RequireAdminKey)
    }
}

/// The external scheduler's endpoint: `x-cron-secret`, a bearer token, or `?secret=`.
#[derive(Debug, Clone, Copy)]
pub struct RequireCronSecret;

impl FromRequestParts<AppState> for RequireCronSecret {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = header_token(&parts.headers, "x-cron-secret")
            .or_else(|| bearer_token(&parts.headers))
            .or_else(|| query_token(parts.uri.query(), "secret"));
        check(token, state.app.config.cron_secret.as_deref())?;
        Ok(RequireCronSecret)
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingKey,
    InvalidKey,
    /// No key is configured, so the route is closed.
    NotConfigured,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let reason = match self {
            AuthError::MissingKey => "Missing key",
            AuthError::InvalidKey => "Invalid key",
            AuthError::NotConfigured => "Access key not configured",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "unauthorized", "reason": reason })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_keys() {
        assert!(check(Some("k".to_string()), Some("k")).is_ok());
        assert!(matches!(check(Some("x".to_string()), Some("k")), Err(AuthError::InvalidKey)));
        assert!(matches!(check(None, Some("k")), Err(AuthError::MissingKey)));
        assert!(matches!(check(Some("k".to_string()), None), Err(AuthError::NotConfigured)));
    }

    #[test]
    fn reads_query_secret() {
        assert_eq!(
            query_token(Some("a=1&secret=s%20t"), "secret").as_deref(),
            Some("s t")
        );
        assert!(query_token(Some("a=1"), "secret").is_none());
        assert!(query_token(None, "secret").is_none());
    }
}
