//! HTTP route handlers.

pub mod health;
pub mod nope;
pub mod proxy;
pub mod webhooks;
