//! Request routing rules.
//!
//! Each rule inspects a [`RoutingContext`] and either lets the chain continue
//! (possibly after recording header or cookie changes) or decides the
//! request's fate.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::routing::client::is_bot;
use crate::routing::context::{
    RoutingContext, RoutingDecision, RuleOutcome, CSP_ENFORCE_HEADER, MAINTENANCE_PATH,
    NEW_BOOKER_COOKIE, NEW_BOOKER_HEADER, NOPE_PATH, TIMEZONE_HEADER, TIMEZONE_SOURCE_HEADER,
};
use crate::services::{Banlist, MaintenanceFlagSource, SubteamDirectory};

lazy_static! {
    /// `/:slug` or `/:slug/:event`.
    static ref ORG_SLUG_PATH: Regex = Regex::new(r"^/([^/]+)(/[^/]+)?$").unwrap();
}

/// Path prefixes guarded against crawlers and forged callbacks.
const ABUSE_GUARDED_PREFIXES: [&str; 2] = ["/api/collect-events", "/api/auth"];
const LEGACY_ROUTING_FORMS: &str = "/apps/routing_forms";
const ROUTING_FORMS: &str = "/apps/routing-forms";

/// A single step of the routing chain.
#[async_trait::async_trait]
pub trait Rule: Send + Sync {
    /// The name of this rule (used for logging and metrics).
    fn name(&self) -> &'static str;

    /// Inspect the request, recording changes on `ctx`.
    async fn apply(&self, ctx: &mut RoutingContext) -> RuleOutcome;
}

fn redirect_to_nope(ctx: &RoutingContext) -> RuleOutcome {
    RuleOutcome::Decide(RoutingDecision::Redirect(ctx.url_with_path(NOPE_PATH)))
}

/// Flags the new booking experience for embed and non-embed requests.
#[derive(Debug, Clone, Default)]
pub struct NewBookerToggle {
    pub for_non_embed: bool,
    pub for_embed: bool,
}

#[async_trait::async_trait]
impl Rule for NewBookerToggle {
    fn name(&self) -> &'static str {
        "new_booker_toggle"
    }

    async fn apply(&self, ctx: &mut RoutingContext) -> RuleOutcome {
        let enabled = if ctx.is_embed() {
            self.for_embed
        } else {
            self.for_non_embed
        };

        if enabled {
            ctx.set_cookie(NEW_BOOKER_COOKIE, "1");
            ctx.set_request_header(NEW_BOOKER_HEADER, "1");
        }
        RuleOutcome::Continue
    }
}

/// Serves the organization profile at the root of an organization domain.
#[derive(Debug, Clone, Default)]
pub struct OrgRootRewrite;

#[async_trait::async_trait]
impl Rule for OrgRootRewrite {
    fn name(&self) -> &'static str {
        "org_root_rewrite"
    }

    async fn apply(&self, ctx: &mut RoutingContext) -> RuleOutcome {
        match ctx.org.valid_org() {
            Some(org) if ctx.path() == "/" => {
                let target = ctx.url_with_path(&format!("/org/{}", org));
                RuleOutcome::Decide(RoutingDecision::Rewrite(target))
            }
            _ => RuleOutcome::Continue,
        }
    }
}

/// Ends requests from banned addresses at the no-op endpoint.
pub struct IpBanlistGuard {
    pub banlist: Arc<dyn Banlist>,
}

#[async_trait::async_trait]
impl Rule for IpBanlistGuard {
    fn name(&self) -> &'static str {
        "ip_banlist"
    }

    async fn apply(&self, ctx: &mut RoutingContext) -> RuleOutcome {
        let banned = ctx.client_ip.is_some_and(|ip| self.banlist.is_banned(ip));
        if banned && ctx.path() != NOPE_PATH {
            tracing::info!(client_ip = ?ctx.client_ip, path = %ctx.path(), "Banned client redirected");
            return redirect_to_nope(ctx);
        }
        RuleOutcome::Continue
    }
}

/// Shows the maintenance page on non-API paths while maintenance is on.
///
/// A failing flag lookup counts as maintenance off.
pub struct MaintenanceGate {
    pub source: Arc<dyn MaintenanceFlagSource>,
}

#[async_trait::async_trait]
impl Rule for MaintenanceGate {
    fn name(&self) -> &'static str {
        "maintenance"
    }

    async fn apply(&self, ctx: &mut RoutingContext) -> RuleOutcome {
        if ctx.path().starts_with("/api") {
            return RuleOutcome::Continue;
        }

        match self.source.is_in_maintenance_mode().await {
            Ok(true) => {
                RuleOutcome::Decide(RoutingDecision::Rewrite(ctx.url_with_path(MAINTENANCE_PATH)))
            }
            Ok(false) => RuleOutcome::Continue,
            Err(e) => {
                tracing::debug!(error = %e, "Maintenance flag unavailable, serving normally");
                RuleOutcome::Continue
            }
        }
    }
}

/// Turns away crawlers, foreign callback URLs and banned clients on the
/// authentication and event collection endpoints.
pub struct AbuseGuard {
    pub banlist: Arc<dyn Banlist>,
    pub allowed_origins: Vec<String>,
}

impl AbuseGuard {
    fn callback_allowed(&self, callback_url: &str) -> bool {
        callback_url.is_empty()
            || self
                .allowed_origins
                .iter()
                .any(|origin| !origin.is_empty() && callback_url.starts_with(origin.as_str()))
    }
}

#[async_trait::async_trait]
impl Rule for AbuseGuard {
    fn name(&self) -> &'static str {
        "abuse_guard"
    }

    async fn apply(&self, ctx: &mut RoutingContext) -> RuleOutcome {
        if !ABUSE_GUARDED_PREFIXES
            .iter()
            .any(|prefix| ctx.path().starts_with(prefix))
        {
            return RuleOutcome::Continue;
        }

        let bot = ctx.header("user-agent").is_some_and(is_bot);
        let bad_callback = ctx
            .query_param("callbackUrl")
            .is_some_and(|cb| !self.callback_allowed(&cb));
        let banned = ctx.client_ip.is_some_and(|ip| self.banlist.is_banned(ip));

        if bot || bad_callback || banned {
            tracing::info!(
                path = %ctx.path(),
                bot,
                bad_callback,
                banned,
                "Abusive request redirected"
            );
            return redirect_to_nope(ctx);
        }
        RuleOutcome::Continue
    }
}

/// Adds the `embed` query parameter to `/embed` pages that lack it.
#[derive(Debug, Clone, Default)]
pub struct EmbedParamRedirect;

#[async_trait::async_trait]
impl Rule for EmbedParamRedirect {
    fn name(&self) -> &'static str {
        "embed_param"
    }

    async fn apply(&self, ctx: &mut RoutingContext) -> RuleOutcome {
        if !ctx.path().ends_with("/embed") || ctx.is_embed() {
            return RuleOutcome::Continue;
        }

        let mut target = ctx.url.clone();
        target.query_pairs_mut().append_pair("embed", "");
        RuleOutcome::Decide(RoutingDecision::Redirect(target))
    }
}

/// Keeps old routing forms links working.
#[derive(Debug, Clone, Default)]
pub struct RoutingFormsRename;

#[async_trait::async_trait]
impl Rule for RoutingFormsRename {
    fn name(&self) -> &'static str {
        "routing_forms_rename"
    }

    async fn apply(&self, ctx: &mut RoutingContext) -> RuleOutcome {
        match ctx.path().strip_prefix(LEGACY_ROUTING_FORMS) {
            Some(rest) => {
                let target = ctx.url_with_path(&format!("{}{}", ROUTING_FORMS, rest));
                RuleOutcome::Decide(RoutingDecision::Rewrite(target))
            }
            None => RuleOutcome::Continue,
        }
    }
}

/// Passes the edge-detected timezone to RPC handlers.
#[derive(Debug, Clone, Default)]
pub struct TimezoneHeader;

#[async_trait::async_trait]
impl Rule for TimezoneHeader {
    fn name(&self) -> &'static str {
        "timezone_header"
    }

    async fn apply(&self, ctx: &mut RoutingContext) -> RuleOutcome {
        if ctx.path().starts_with("/api/trpc/") {
            let timezone = ctx.header(TIMEZONE_SOURCE_HEADER).unwrap_or_default().to_string();
            ctx.set_request_header(TIMEZONE_HEADER, &timezone);
        }
        RuleOutcome::Continue
    }
}

/// Enforces the content security policy on the login page.
#[derive(Debug, Clone, Default)]
pub struct CspEnforceHeader;

#[async_trait::async_trait]
impl Rule for CspEnforceHeader {
    fn name(&self) -> &'static str {
        "csp_enforce"
    }

    async fn apply(&self, ctx: &mut RoutingContext) -> RuleOutcome {
        if ctx.path().starts_with("/auth/login") {
            ctx.set_request_header(CSP_ENFORCE_HEADER, "true");
        }
        RuleOutcome::Continue
    }
}

/// Serves organization subteams at `/:team` on the organization domain.
///
/// Slugs that are not subteams stay untouched and reach the user pages.
pub struct OrgSubteamRewrite {
    pub directory: Arc<dyn SubteamDirectory>,
}

#[async_trait::async_trait]
impl Rule for OrgSubteamRewrite {
    fn name(&self) -> &'static str {
        "org_subteam_rewrite"
    }

    async fn apply(&self, ctx: &mut RoutingContext) -> RuleOutcome {
        let Some(org) = ctx.org.valid_org() else {
            return RuleOutcome::Continue;
        };

        let (team, rest) = match ORG_SLUG_PATH.captures(ctx.path()) {
            Some(caps) => (
                caps[1].to_string(),
                caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
            ),
            None => return RuleOutcome::Continue,
        };

        match self.directory.subteam_slugs(org).await {
            Ok(slugs) if slugs.iter().any(|slug| *slug == team) => {
                let target = ctx.url_with_path(&format!("/team/{}{}", team, rest));
                RuleOutcome::Decide(RoutingDecision::Rewrite(target))
            }
            Ok(_) => RuleOutcome::Continue,
            Err(e) => {
                tracing::debug!(org = %org, error = %e, "Subteam lookup failed");
                RuleOutcome::Continue
            }
        }
    }
}
