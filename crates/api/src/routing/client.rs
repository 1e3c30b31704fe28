//! Client identification: address and crawler detection.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// User agents of search crawlers and link-preview fetchers.
    static ref BOT_USER_AGENT: Regex = Regex::new(
        r"(?i)Googlebot|Mediapartners-Google|AdsBot-Google|googleweblight|Storebot-Google|Google-PageRenderer|Bingbot|BingPreview|Slurp|DuckDuckBot|baiduspider|yandex|sogou|LinkedInBot|bitlybot|tumblr|vkShare|quora link preview|facebookexternalhit|facebookcatalog|Twitterbot|applebot|redditbot|Slackbot|Discordbot|WhatsApp|SkypeUriPreview|ia_archiver"
    )
    .unwrap();
}

/// Address of the client that sent the request.
///
/// Prefers `x-real-ip`, then the first entry of `x-forwarded-for`, then the
/// socket peer. Unparseable header values are skipped.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    let real_ip: Option<IpAddr> = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());

    let forwarded_for = || -> Option<IpAddr> {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse().ok())
    };

    real_ip
        .or_else(forwarded_for)
        .or_else(|| peer.map(|addr| addr.ip()))
}

/// Whether a user agent string belongs to a known crawler.
pub fn is_bot(user_agent: &str) -> bool {
    BOT_USER_AGENT.is_match(user_agent)
}
