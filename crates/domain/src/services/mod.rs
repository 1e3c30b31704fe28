//! Domain services for Booking Edge.

pub mod webhook_lookup;

pub use webhook_lookup::{get_webhooks, InMemoryWebhookStore, WebhookStore, WebhookStoreError};
