//! Clients and helpers for the collaborators of the edge service.

pub mod banlist;
pub mod cookies;
pub mod edge_config;
pub mod subteams;
pub mod upstream;

use thiserror::Error;

pub use banlist::{Banlist, StaticBanlist};
pub use edge_config::{EdgeConfigClient, MaintenanceFlagSource};
pub use subteams::{HttpSubteamDirectory, SubteamDirectory};
pub use upstream::UpstreamClient;

/// Errors from calls to remote collaborators.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
