//! Fallback handler forwarding unmatched requests to the web application.

use axum::{body::Body, extract::State, http::Request, response::Response};

use crate::app::AppState;
use crate::error::ApiError;

/// Forward the (possibly rewritten) request upstream.
pub async fn forward(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response, ApiError> {
    state.upstream.forward(req).await
}
