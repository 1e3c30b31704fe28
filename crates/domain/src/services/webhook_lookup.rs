//! Webhook subscriber lookup.
//!
//! The lookup itself is a single query delegated to a [`WebhookStore`]. The
//! application constructs one store at startup and passes it to every call;
//! tests hand in an [`InMemoryWebhookStore`] instead.

use thiserror::Error;

use crate::models::webhook::{
    GetSubscriberOptions, SubscriberFilter, WebhookRecord, WebhookSubscriber,
};

/// Errors raised by a webhook store.
#[derive(Debug, Error)]
pub enum WebhookStoreError {
    #[error("Webhook store query failed: {0}")]
    Query(String),
}

/// Read access to persisted webhook subscriptions.
#[async_trait::async_trait]
pub trait WebhookStore: Send + Sync {
    /// Return every subscription matching `filter`, in store order.
    async fn find_subscribers(
        &self,
        filter: &SubscriberFilter,
    ) -> Result<Vec<WebhookSubscriber>, WebhookStoreError>;
}

/// Find the active subscribers for a trigger event.
///
/// Matches subscriptions owned by the user (only when no team is given),
/// attached to the event type, or attached to the team, that list the
/// trigger event and are active. An empty result is not an error. Store
/// failures are returned to the caller unchanged.
pub async fn get_webhooks(
    options: &GetSubscriberOptions,
    store: &dyn WebhookStore,
) -> Result<Vec<WebhookSubscriber>, WebhookStoreError> {
    let filter = SubscriberFilter::from(options);
    let subscribers = store.find_subscribers(&filter).await?;

    tracing::debug!(
        user_id = filter.user_id,
        event_type_id = filter.event_type_id,
        team_id = ?filter.team_id,
        trigger_event = %filter.trigger_event,
        count = subscribers.len(),
        "Resolved webhook subscribers"
    );

    Ok(subscribers)
}

/// In-memory webhook store for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryWebhookStore {
    records: Vec<WebhookRecord>,
    /// Whether to simulate store failures for testing.
    pub simulate_failure: bool,
}

impl InMemoryWebhookStore {
    /// Create a store holding the given records.
    pub fn new(records: Vec<WebhookRecord>) -> Self {
        Self {
            records,
            simulate_failure: false,
        }
    }

    /// Create a store whose queries always fail.
    pub fn failing() -> Self {
        Self {
            records: Vec::new(),
            simulate_failure: true,
        }
    }
}

#[async_trait::async_trait]
impl WebhookStore for InMemoryWebhookStore {
    async fn find_subscribers(
        &self,
        filter: &SubscriberFilter,
    ) -> Result<Vec<WebhookSubscriber>, WebhookStoreError> {
        if self.simulate_failure {
            return Err(WebhookStoreError::Query("Simulated failure".to_string()));
        }

        Ok(self
            .records
            .iter()
            .filter(|record| filter.matches(record))
            .map(WebhookSubscriber::from)
            .collect())
    }
}
