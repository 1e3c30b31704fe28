//! Shared-token authentication for internal endpoints.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;

/// Header carrying the internal API token.
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(expected: &str, provided: &str) -> bool {
    expected.len() == provided.len()
        && expected
            .bytes()
            .zip(provided.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Middleware that requires `x-internal-token` to equal the configured token.
pub async fn require_internal_token(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let expected = state.config.security.internal_api_token.as_str();
    let authorized = match req
        .headers()
        .get(INTERNAL_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(token) => !expected.is_empty() && tokens_match(expected, token),
        None => {
            return ApiError::Unauthorized("Missing internal token".into()).into_response();
        }
    };

    if !authorized {
        return ApiError::Unauthorized("Invalid internal token".into()).into_response();
    }
    next.run(req).await
}
