//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod webhook;

pub use webhook::WebhookSubscriberEntity;
