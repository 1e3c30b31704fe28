//! Forwarding of routed requests to the upstream web application.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, Request},
    response::Response,
};
use reqwest::Client;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::ApiError;
use crate::services::RemoteError;

/// Connection-level headers that must not be forwarded.
const HOP_BY_HOP_HEADERS: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS.iter() {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// Forwards requests to the configured upstream.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: Option<Url>,
    max_body_size: usize,
}

impl UpstreamClient {
    pub fn new(
        client: Client,
        config: &UpstreamConfig,
        max_body_size: usize,
    ) -> Result<Self, RemoteError> {
        let base_url = if config.url.trim().is_empty() {
            None
        } else {
            Some(Url::parse(config.url.trim())?)
        };

        Ok(Self {
            client,
            base_url,
            max_body_size,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    fn target_url(&self, base: &Url, path_and_query: &str) -> Result<Url, ApiError> {
        let origin = base.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", origin, path_and_query))
            .map_err(|e| ApiError::Internal(format!("Invalid upstream URL: {}", e)))
    }

    /// Send `req` upstream and relay the answer.
    ///
    /// The forwarded `Host` is the upstream's; the original host travels in
    /// `x-forwarded-host`.
    pub async fn forward(&self, req: Request<Body>) -> Result<Response, ApiError> {
        let base = self
            .base_url
            .as_ref()
            .ok_or_else(|| ApiError::NotFound("No upstream configured".into()))?;

        let (parts, body) = req.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = self.target_url(base, path_and_query)?;

        let body = axum::body::to_bytes(body, self.max_body_size)
            .await
            .map_err(|e| ApiError::Validation(format!("Request body rejected: {}", e)))?;

        let mut headers = parts.headers.clone();
        if let Some(host) = parts.headers.get(header::HOST) {
            headers.insert("x-forwarded-host", host.clone());
        }
        strip_hop_by_hop(&mut headers);

        tracing::debug!(method = %parts.method, url = %url, "Forwarding request upstream");

        let upstream = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = upstream.status();
        let mut response_headers = upstream.headers().clone();
        strip_hop_by_hop(&mut response_headers);
        let bytes = upstream.bytes().await?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}
