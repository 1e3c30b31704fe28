pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod routing;
pub mod services;
