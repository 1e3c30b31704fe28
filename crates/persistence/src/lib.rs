//! Persistence layer for Booking Edge.
//!
//! This crate contains:
//! - Database connection management and query metrics
//! - Entity definitions (database row mappings)
//! - The Postgres-backed webhook store

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
