//! Domain layer for Booking Edge.
//!
//! This crate contains:
//! - Webhook subscription models and trigger events
//! - The webhook store seam and the subscriber lookup built on it

pub mod models;
pub mod services;
