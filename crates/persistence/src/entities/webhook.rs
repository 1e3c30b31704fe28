//! Webhook entity (database row mapping).

use sqlx::FromRow;

use domain::models::webhook::WebhookSubscriber;

/// Row returned by the subscriber lookup.
#[derive(Debug, Clone, FromRow)]
pub struct WebhookSubscriberEntity {
    pub id: String,
    pub user_id: Option<i32>,
    pub team_id: Option<i32>,
    pub event_type_id: Option<i32>,
    pub subscriber_url: String,
    pub payload_template: Option<String>,
    pub app_id: Option<String>,
    pub secret: Option<String>,
}

impl From<WebhookSubscriberEntity> for WebhookSubscriber {
    fn from(entity: WebhookSubscriberEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            team_id: entity.team_id,
            event_type_id: entity.event_type_id,
            subscriber_url: entity.subscriber_url,
            payload_template: entity.payload_template,
            app_id: entity.app_id,
            secret: entity.secret,
        }
    }
}
