//! Internal webhook subscriber lookup.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use domain::models::{GetSubscriberOptions, WebhookSubscriber};
use domain::services::get_webhooks;

use crate::app::AppState;
use crate::error::ApiError;

/// List the subscribers of a trigger event.
///
/// GET /api/internal/webhooks/subscribers?userId=&eventTypeId=&teamId=&triggerEvent=
pub async fn list_subscribers(
    State(state): State<AppState>,
    query: Result<Query<GetSubscriberOptions>, QueryRejection>,
) -> Result<Json<Vec<WebhookSubscriber>>, ApiError> {
    let Query(options) = query.map_err(|e| ApiError::Validation(e.body_text()))?;

    let subscribers = get_webhooks(&options, state.webhooks.as_ref()).await?;
    Ok(Json(subscribers))
}
