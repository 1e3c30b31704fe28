//! Repository implementations for database operations.

pub mod webhook;

pub use webhook::PgWebhookStore;
