//! Middleware applying the routing rule chain before the router sees a request.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::app::AppState;
use crate::routing::{rewrite_uri, RoutingContext, RoutingDecision};

/// Evaluate the rule chain and act on its decision.
///
/// - redirect: answer `307` with the absolute target URL
/// - rewrite: replace path and query, forward cookie changes
/// - next: forward cookie and header changes
///
/// Every request goes through the chain, including ones without a usable
/// `Host` header.
pub async fn route_request(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);

    let mut ctx = RoutingContext::from_parts(req.uri(), req.headers(), peer, &state.org_domains);

    match state.rule_chain.evaluate(&mut ctx).await {
        RoutingDecision::Redirect(target) => Redirect::temporary(target.as_str()).into_response(),
        RoutingDecision::Rewrite(target) => {
            match rewrite_uri(&target) {
                Ok(uri) => *req.uri_mut() = uri,
                Err(e) => {
                    tracing::warn!(target_url = %target, error = %e, "Invalid rewrite target");
                }
            }
            ctx.apply_cookies(req.headers_mut());
            next.run(req).await
        }
        RoutingDecision::Next => {
            ctx.apply_cookies(req.headers_mut());
            ctx.apply_request_headers(req.headers_mut());
            next.run(req).await
        }
    }
}
