//! Webhook subscription domain models.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Events a webhook subscription can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookTriggerEvent {
    BookingCreated,
    BookingPaid,
    BookingRescheduled,
    BookingRequested,
    BookingCancelled,
    BookingRejected,
    FormSubmitted,
    MeetingEnded,
    RecordingReady,
}

impl WebhookTriggerEvent {
    pub const ALL: [WebhookTriggerEvent; 9] = [
        WebhookTriggerEvent::BookingCreated,
        WebhookTriggerEvent::BookingPaid,
        WebhookTriggerEvent::BookingRescheduled,
        WebhookTriggerEvent::BookingRequested,
        WebhookTriggerEvent::BookingCancelled,
        WebhookTriggerEvent::BookingRejected,
        WebhookTriggerEvent::FormSubmitted,
        WebhookTriggerEvent::MeetingEnded,
        WebhookTriggerEvent::RecordingReady,
    ];

    /// Stored representation, as found in the `event_triggers` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookTriggerEvent::BookingCreated => "BOOKING_CREATED",
            WebhookTriggerEvent::BookingPaid => "BOOKING_PAID",
            WebhookTriggerEvent::BookingRescheduled => "BOOKING_RESCHEDULED",
            WebhookTriggerEvent::BookingRequested => "BOOKING_REQUESTED",
            WebhookTriggerEvent::BookingCancelled => "BOOKING_CANCELLED",
            WebhookTriggerEvent::BookingRejected => "BOOKING_REJECTED",
            WebhookTriggerEvent::FormSubmitted => "FORM_SUBMITTED",
            WebhookTriggerEvent::MeetingEnded => "MEETING_ENDED",
            WebhookTriggerEvent::RecordingReady => "RECORDING_READY",
        }
    }
}

impl FromStr for WebhookTriggerEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WebhookTriggerEvent::ALL
            .into_iter()
            .find(|event| event.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown trigger event: {}", s))
    }
}

impl std::fmt::Display for WebhookTriggerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored webhook subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRecord {
    pub id: String,
    pub user_id: Option<i32>,
    pub team_id: Option<i32>,
    pub event_type_id: Option<i32>,
    pub subscriber_url: String,
    pub payload_template: Option<String>,
    pub app_id: Option<String>,
    pub secret: Option<String>,
    pub active: bool,
    pub event_triggers: Vec<WebhookTriggerEvent>,
}

/// The fields of a subscription handed to webhook senders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSubscriber {
    pub id: String,
    pub user_id: Option<i32>,
    pub team_id: Option<i32>,
    pub event_type_id: Option<i32>,
    pub subscriber_url: String,
    pub payload_template: Option<String>,
    pub app_id: Option<String>,
    pub secret: Option<String>,
}

impl From<&WebhookRecord> for WebhookSubscriber {
    fn from(record: &WebhookRecord) -> Self {
        Self {
            id: record.id.clone(),
            user_id: record.user_id,
            team_id: record.team_id,
            event_type_id: record.event_type_id,
            subscriber_url: record.subscriber_url.clone(),
            payload_template: record.payload_template.clone(),
            app_id: record.app_id.clone(),
            secret: record.secret.clone(),
        }
    }
}

/// Input for a subscriber lookup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSubscriberOptions {
    pub user_id: i32,
    #[serde(default)]
    pub team_id: Option<i32>,
    pub event_type_id: i32,
    pub trigger_event: WebhookTriggerEvent,
}

/// Filter handed to a [`crate::services::WebhookStore`].
///
/// When a team is given, the owner filter is pinned to `0` so that personal
/// subscriptions of the acting user are not picked up for team bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberFilter {
    pub user_id: i32,
    pub event_type_id: i32,
    pub team_id: Option<i32>,
    pub trigger_event: WebhookTriggerEvent,
}

impl From<&GetSubscriberOptions> for SubscriberFilter {
    fn from(options: &GetSubscriberOptions) -> Self {
        Self {
            user_id: if options.team_id.is_none() {
                options.user_id
            } else {
                0
            },
            event_type_id: options.event_type_id,
            team_id: options.team_id,
            trigger_event: options.trigger_event,
        }
    }
}

impl SubscriberFilter {
    /// Whether a stored record satisfies this filter.
    pub fn matches(&self, record: &WebhookRecord) -> bool {
        let owned = record.user_id == Some(self.user_id)
            || record.event_type_id == Some(self.event_type_id)
            || (self.team_id.is_some() && record.team_id == self.team_id);

        owned && record.active && record.event_triggers.contains(&self.trigger_event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_id: Option<i32>, team_id: Option<i32>, event_type_id: Option<i32>) -> WebhookRecord {
        WebhookRecord {
            id: "wh_1".to_string(),
            user_id,
            team_id,
            event_type_id,
            subscriber_url: "https://hooks.example.com/in".to_string(),
            payload_template: None,
            app_id: None,
            secret: Some("s3cret".to_string()),
            active: true,
            event_triggers: vec![WebhookTriggerEvent::BookingCreated],
        }
    }

    fn options(team_id: Option<i32>) -> GetSubscriberOptions {
        GetSubscriberOptions {
            user_id: 1,
            team_id,
            event_type_id: 5,
            trigger_event: WebhookTriggerEvent::BookingCreated,
        }
    }

    #[test]
    fn test_trigger_event_round_trips_through_str() {
        for event in WebhookTriggerEvent::ALL {
            assert_eq!(event.as_str().parse::<WebhookTriggerEvent>(), Ok(event));
        }
        assert_eq!(
            "booking_cancelled".parse::<WebhookTriggerEvent>(),
            Ok(WebhookTriggerEvent::BookingCancelled)
        );
        assert!("BOOKING_EXPLODED".parse::<WebhookTriggerEvent>().is_err());
    }

    #[test]
    fn test_trigger_event_serde_uses_stored_names() {
        let json = serde_json::to_string(&WebhookTriggerEvent::MeetingEnded).unwrap();
        assert_eq!(json, "\"MEETING_ENDED\"");
    }

    #[test]
    fn test_filter_keeps_user_without_team() {
        let filter = SubscriberFilter::from(&options(None));
        assert_eq!(filter.user_id, 1);
        assert!(filter.matches(&record(Some(1), None, None)));
    }

    #[test]
    fn test_filter_pins_user_to_zero_with_team() {
        let filter = SubscriberFilter::from(&options(Some(9)));
        assert_eq!(filter.user_id, 0);
        assert!(!filter.matches(&record(Some(1), None, None)));
        assert!(filter.matches(&record(None, Some(9), None)));
        assert!(filter.matches(&record(None, None, Some(5))));
    }

    #[test]
    fn test_filter_ignores_team_column_without_team() {
        let filter = SubscriberFilter::from(&options(None));
        assert!(!filter.matches(&record(None, Some(9), None)));
    }

    #[test]
    fn test_filter_requires_active_and_trigger() {
        let filter = SubscriberFilter::from(&options(None));

        let mut inactive = record(Some(1), None, None);
        inactive.active = false;
        assert!(!filter.matches(&inactive));

        let mut other_trigger = record(Some(1), None, None);
        other_trigger.event_triggers = vec![WebhookTriggerEvent::BookingPaid];
        assert!(!filter.matches(&other_trigger));
    }

    #[test]
    fn test_subscriber_projection_serializes_camel_case() {
        let subscriber = WebhookSubscriber::from(&record(Some(1), None, Some(5)));
        let value = serde_json::to_value(&subscriber).unwrap();

        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 8);
        assert_eq!(value["subscriberUrl"], "https://hooks.example.com/in");
        assert_eq!(value["eventTypeId"], 5);
        assert!(value.get("active").is_none());
    }

    #[test]
    fn test_options_deserialize_from_camel_case() {
        let options: GetSubscriberOptions = serde_json::from_str(
            r#"{"userId": 1, "eventTypeId": 5, "triggerEvent": "BOOKING_CREATED"}"#,
        )
        .unwrap();
        assert_eq!(options.team_id, None);
        assert_eq!(options.trigger_event, WebhookTriggerEvent::BookingCreated);
    }
}
