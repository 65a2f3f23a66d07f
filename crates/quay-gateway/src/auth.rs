use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use quay_hooks::{Code, Status};

use crate::errorhandler::ApiError;

/// Bearer-token authentication for the gateway API.
///
/// Discovery endpoints stay open so a client can locate gateway nodes before
/// it has credentials; every other route requires the configured token.
#[derive(Clone)]
pub struct AuthConfig {
    pub api_token: Option<String>,
}

impl AuthConfig {
    pub fn new(api_token: Option<String>) -> Self {
        Self { api_token }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_token.is_some()
    }

    /// Routes that must answer before a caller can authenticate.
    fn is_open_path(path: &str) -> bool {
        matches!(path, "/health" | "/api/v1/topology")
    }

    fn token_matches(&self, presented: &str) -> bool {
        self.api_token
            .as_deref()
            .map(|expected| presented.as_bytes().ct_eq(expected.as_bytes()).into())
            .unwrap_or(false)
    }
}

/// Authentication middleware for the API surface.
pub async fn auth_middleware(
    auth_config: Arc<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    if !auth_config.is_enabled() || AuthConfig::is_open_path(request.uri().path()) {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    match presented {
        Some(token) if auth_config.token_matches(token) => next.run(request).await,
        _ => ApiError(Status::new(
            Code::Unauthenticated,
            "A valid bearer token is required.",
        ))
        .into_response(),
    }
}
