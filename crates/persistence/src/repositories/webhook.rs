//! Postgres-backed webhook store.

use sqlx::PgPool;

use domain::models::webhook::{SubscriberFilter, WebhookRecord, WebhookSubscriber};
use domain::services::{WebhookStore, WebhookStoreError};

use crate::entities::WebhookSubscriberEntity;
use crate::metrics::QueryTimer;

/// Webhook store reading from the `webhooks` table.
#[derive(Clone)]
pub struct PgWebhookStore {
    pool: PgPool,
}

impl PgWebhookStore {
    /// Creates a new PgWebhookStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a subscription.
    pub async fn insert(&self, record: &WebhookRecord) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_webhook");
        let triggers: Vec<String> = record
            .event_triggers
            .iter()
            .map(|event| event.as_str().to_string())
            .collect();

        let result = sqlx::query(
            r#"
            INSERT INTO webhooks (
                id, user_id, team_id, event_type_id, subscriber_url,
                payload_template, app_id, secret, active, event_triggers
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&record.id)
        .bind(record.user_id)
        .bind(record.team_id)
        .bind(record.event_type_id)
        .bind(&record.subscriber_url)
        .bind(&record.payload_template)
        .bind(&record.app_id)
        .bind(&record.secret)
        .bind(record.active)
        .bind(triggers)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|_| ())
    }

    /// Run the subscriber query.
    ///
    /// A NULL team parameter never matches, so `team_id = $3` only selects
    /// rows when a team was supplied.
    pub async fn find_subscriber_rows(
        &self,
        filter: &SubscriberFilter,
    ) -> Result<Vec<WebhookSubscriberEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_webhook_subscribers");
        let result = sqlx::query_as::<_, WebhookSubscriberEntity>(
            r#"
            SELECT id, user_id, team_id, event_type_id, subscriber_url,
                   payload_template, app_id, secret
            FROM webhooks
            WHERE (user_id = $1 OR event_type_id = $2 OR team_id = $3)
              AND $4 = ANY(event_triggers)
              AND active = TRUE
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.event_type_id)
        .bind(filter.team_id)
        .bind(filter.trigger_event.as_str())
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        result
    }
}

#[async_trait::async_trait]
impl WebhookStore for PgWebhookStore {
    async fn find_subscribers(
        &self,
        filter: &SubscriberFilter,
    ) -> Result<Vec<WebhookSubscriber>, WebhookStoreError> {
        let rows = self
            .find_subscriber_rows(filter)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Webhook subscriber query failed");
                WebhookStoreError::Query(e.to_string())
            })?;

        Ok(rows.into_iter().map(WebhookSubscriber::from).collect())
    }
}
