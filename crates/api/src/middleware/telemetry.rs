//! Page-view telemetry wrapping the whole edge service.
//!
//! Every recorded request emits one event on the `telemetry` tracing target
//! and bumps `telemetry_events_total`. Visitors are identified by a cookie,
//! issued on their first recorded request.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use metrics::counter;
use uuid::Uuid;

use crate::app::AppState;
use crate::config::TelemetryConfig;
use crate::services::cookies::{build_cookie, RequestCookies};

fn is_recorded(config: &TelemetryConfig, path: &str) -> bool {
    config.enabled
        && !config
            .skip_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && path.starts_with(prefix.as_str()))
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Record a page-view event for the request.
pub async fn collect_events(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let config = &state.config.telemetry;
    let path = req.uri().path().to_string();
    if !is_recorded(config, &path) {
        return next.run(req).await;
    }

    let existing_visitor = RequestCookies::from_headers(req.headers())
        .get(&config.cookie_name)
        .map(str::to_string);
    let visitor_id = existing_visitor
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = req.method().clone();
    let referrer = header_str(req.headers(), header::REFERER);
    let user_agent = header_str(req.headers(), header::USER_AGENT);
    let org_domain = state
        .org_domains
        .resolve(&header_str(req.headers(), header::HOST))
        .is_valid_org_domain;

    let start = Instant::now();
    let mut response = next.run(req).await;

    tracing::info!(
        target: "telemetry",
        event = "page_view",
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        visitor_id = %visitor_id,
        referrer = %referrer,
        user_agent = %user_agent,
        org_domain,
        timestamp = %Utc::now().to_rfc3339(),
        "Page view"
    );
    counter!("telemetry_events_total").increment(1);

    if existing_visitor.is_none() {
        match HeaderValue::from_str(&build_cookie(&config.cookie_name, &visitor_id, None)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::debug!(error = %e, "Cannot set visitor cookie"),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool) -> TelemetryConfig {
        TelemetryConfig {
            enabled,
            skip_prefixes: vec!["/api/health".to_string(), "/_next".to_string()],
            ..TelemetryConfig::default()
        }
    }

    #[test]
    fn test_is_recorded() {
        assert!(is_recorded(&config(true), "/john"));
        assert!(is_recorded(&config(true), "/api/nope"));
        assert!(!is_recorded(&config(true), "/api/health/live"));
        assert!(!is_recorded(&config(true), "/_next/static/app.js"));
        assert!(!is_recorded(&config(false), "/john"));
    }

    #[test]
    fn test_empty_skip_prefix_is_ignored() {
        let config = TelemetryConfig {
            enabled: true,
            skip_prefixes: vec![String::new()],
            ..TelemetryConfig::default()
        };
        assert!(is_recorded(&config, "/john"));
    }
}
