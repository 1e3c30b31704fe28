//! No-op endpoint ending abusive or banned requests.

use axum::http::StatusCode;

/// Answers `200` with an empty body and does nothing else.
pub async fn nope() -> StatusCode {
    StatusCode::OK
}
