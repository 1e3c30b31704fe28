//! Domain models for Booking Edge.

pub mod webhook;

pub use webhook::{
    GetSubscriberOptions, SubscriberFilter, WebhookRecord, WebhookSubscriber, WebhookTriggerEvent,
};
