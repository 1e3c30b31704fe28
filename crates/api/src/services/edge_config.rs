//! Remote feature configuration store client.
//!
//! Reads single items over the edge config REST interface:
//! `GET {base_url}/item/{key}` with an optional bearer token.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::EdgeConfigConfig;
use crate::services::RemoteError;

/// Key of the boolean maintenance flag.
pub const MAINTENANCE_KEY: &str = "isInMaintenanceMode";

/// Source of the application-wide maintenance flag.
#[async_trait::async_trait]
pub trait MaintenanceFlagSource: Send + Sync {
    async fn is_in_maintenance_mode(&self) -> Result<bool, RemoteError>;
}

/// HTTP client for the remote config store.
#[derive(Debug, Clone)]
pub struct EdgeConfigClient {
    client: Client,
    base_url: Option<String>,
    token: Option<String>,
}

impl EdgeConfigClient {
    /// Create a client. An empty URL yields an unconfigured client whose
    /// reads fail with [`RemoteError::NotConfigured`].
    pub fn new(client: Client, config: &EdgeConfigConfig) -> Result<Self, RemoteError> {
        let base_url = if config.url.trim().is_empty() {
            None
        } else {
            let parsed = Url::parse(config.url.trim())?;
            Some(parsed.as_str().trim_end_matches('/').to_string())
        };

        let token = Some(config.token.trim().to_string()).filter(|t| !t.is_empty());

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Read one item. A missing item is `Ok(None)`.
    pub async fn get_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RemoteError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or(RemoteError::NotConfigured("Edge config"))?;
        let url = Url::parse(&format!("{}/item/{}", base_url, key))?;

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<T>().await?)),
            status => Err(RemoteError::Status(status.as_u16())),
        }
    }
}

#[async_trait::async_trait]
impl MaintenanceFlagSource for EdgeConfigClient {
    async fn is_in_maintenance_mode(&self) -> Result<bool, RemoteError> {
        Ok(self.get_item::<bool>(MAINTENANCE_KEY).await?.unwrap_or(false))
    }
}
