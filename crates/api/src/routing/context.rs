//! Per-request routing state and decisions.

use std::net::{IpAddr, SocketAddr};

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Uri};
use lazy_static::lazy_static;
use url::Url;

use crate::routing::client::client_ip;
use crate::routing::org_domain::{OrgDomain, OrgDomainResolver};
use crate::services::cookies::RequestCookies;

/// Redirect target that ends abusive or banned requests.
pub const NOPE_PATH: &str = "/api/nope";
/// Page shown while the application is in maintenance mode.
pub const MAINTENANCE_PATH: &str = "/maintenance";

/// Cookie and header flagging the new booking experience.
pub const NEW_BOOKER_COOKIE: &str = "new-booker-enabled";
pub const NEW_BOOKER_HEADER: &str = "new-booker-enabled";
pub const TIMEZONE_SOURCE_HEADER: &str = "x-vercel-ip-timezone";
pub const TIMEZONE_HEADER: &str = "x-cal-timezone";
pub const CSP_ENFORCE_HEADER: &str = "x-csp-enforce";

/// Outcome of running the rule chain over a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Serve the request as if it had been made to this URL.
    Rewrite(Url),
    /// Answer with a temporary redirect to this URL.
    Redirect(Url),
    /// Forward the request with the collected header changes.
    Next,
}

impl RoutingDecision {
    pub fn kind(&self) -> &'static str {
        match self {
            RoutingDecision::Rewrite(_) => "rewrite",
            RoutingDecision::Redirect(_) => "redirect",
            RoutingDecision::Next => "next",
        }
    }
}

/// Result of a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Continue,
    Decide(RoutingDecision),
}

/// Host used when the request names none, or one that does not parse.
pub const FALLBACK_HOST: &str = "localhost";

lazy_static! {
    static ref FALLBACK_ORIGIN: Url = Url::parse(&format!("http://{}/", FALLBACK_HOST)).unwrap();
}

/// Everything the rules may inspect or change about a request.
///
/// `headers` and `url` describe the inbound request and are not modified by
/// rules; decisions carry their own target URLs. Header changes go to
/// `request_headers`, cookie changes to `cookies`.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    pub url: Url,
    pub headers: HeaderMap,
    pub cookies: RequestCookies,
    pub client_ip: Option<IpAddr>,
    pub org: OrgDomain,
    pub request_headers: HeaderMap,
    cookies_changed: bool,
}

impl RoutingContext {
    /// Build a context from the parts of an inbound request.
    ///
    /// The scheme comes from `x-forwarded-proto` (default `http`), the host
    /// from the `Host` header, falling back to the URI authority and then to
    /// [`FALLBACK_HOST`]. Path and query always come from the request URI.
    pub fn from_parts(
        uri: &Uri,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
        resolver: &OrgDomainResolver,
    ) -> Self {
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| v == "http" || v == "https")
            .unwrap_or_else(|| "http".to_string());

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .unwrap_or_default();

        let (mut url, org) = match origin(&scheme, &host) {
            Some(url) => (url, resolver.resolve(&host)),
            None => {
                tracing::debug!(host = %host, "Unusable request host, routing on fallback host");
                (fallback_origin(&scheme), OrgDomain::default())
            }
        };
        url.set_path(uri.path());
        url.set_query(uri.query());

        Self {
            url,
            headers: headers.clone(),
            cookies: RequestCookies::from_headers(headers),
            client_ip: client_ip(headers, peer),
            org,
            request_headers: HeaderMap::new(),
            cookies_changed: false,
        }
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// First value of a query parameter; `Some("")` for a bare `?name=`.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Whether the request comes from an embedded booking widget.
    pub fn is_embed(&self) -> bool {
        self.query_param("embed").is_some()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The request URL with another path, query kept.
    pub fn url_with_path(&self, path: &str) -> Url {
        let mut url = self.url.clone();
        url.set_path(path);
        url
    }

    /// Set a header on the forwarded request.
    ///
    /// Values that are not valid header values are dropped.
    pub fn set_request_header(&mut self, name: &'static str, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.request_headers
                    .insert(HeaderName::from_static(name), value);
            }
            Err(_) => {
                tracing::debug!(header = name, "Dropping invalid header value");
            }
        }
    }

    /// Set a cookie on the forwarded request.
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.set(name, value);
        self.cookies_changed = true;
    }

    /// Apply cookie changes to the headers of the forwarded request.
    pub fn apply_cookies(&self, headers: &mut HeaderMap) {
        if self.cookies_changed {
            self.cookies.write_to(headers);
        }
    }

    /// Apply header changes to the headers of the forwarded request.
    pub fn apply_request_headers(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.request_headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}

/// `{scheme}://{host}/` when `host` is a plain host with optional port.
fn origin(scheme: &str, host: &str) -> Option<Url> {
    if host.is_empty() {
        return None;
    }
    let url = Url::parse(&format!("{}://{}/", scheme, host)).ok()?;
    let plain = url.has_host()
        && url.path() == "/"
        && url.query().is_none()
        && url.fragment().is_none()
        && url.username().is_empty()
        && url.password().is_none();
    plain.then_some(url)
}

fn fallback_origin(scheme: &str) -> Url {
    let mut url = FALLBACK_ORIGIN.clone();
    // Only fails when switching between special and non-special schemes.
    let _ = url.set_scheme(scheme);
    url
}

/// Path and query of `url` as a request URI.
pub fn rewrite_uri(url: &Url) -> Result<Uri, axum::http::uri::InvalidUri> {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query).parse(),
        None => url.path().parse(),
    }
}
