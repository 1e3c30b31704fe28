use axum::{middleware, routing::get, Router};
use domain::services::WebhookStore;
use persistence::repositories::PgWebhookStore;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower::Layer;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    collect_events, metrics_handler, metrics_middleware, require_internal_token, route_request,
    trace_id,
};
use crate::routes::{health, nope, proxy, webhooks};
use crate::routing::{OrgDomainResolver, RoutingDeps, RuleChain};
use crate::services::{
    Banlist, EdgeConfigClient, HttpSubteamDirectory, MaintenanceFlagSource, RemoteError,
    StaticBanlist, SubteamDirectory, UpstreamClient,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub org_domains: Arc<OrgDomainResolver>,
    pub rule_chain: Arc<RuleChain>,
    pub webhooks: Arc<dyn WebhookStore>,
    pub upstream: Arc<UpstreamClient>,
    pub edge_config_configured: bool,
}

impl AppState {
    /// Start building state with the production collaborators.
    pub fn builder(config: Config, pool: PgPool) -> AppStateBuilder {
        AppStateBuilder {
            config,
            pool,
            banlist: None,
            maintenance: None,
            subteams: None,
            webhooks: None,
        }
    }
}

/// Builds [`AppState`], allowing any collaborator to be replaced.
pub struct AppStateBuilder {
    config: Config,
    pool: PgPool,
    banlist: Option<Arc<dyn Banlist>>,
    maintenance: Option<Arc<dyn MaintenanceFlagSource>>,
    subteams: Option<Arc<dyn SubteamDirectory>>,
    webhooks: Option<Arc<dyn WebhookStore>>,
}

impl AppStateBuilder {
    pub fn with_banlist(mut self, banlist: Arc<dyn Banlist>) -> Self {
        self.banlist = Some(banlist);
        self
    }

    pub fn with_maintenance(mut self, source: Arc<dyn MaintenanceFlagSource>) -> Self {
        self.maintenance = Some(source);
        self
    }

    pub fn with_subteams(mut self, directory: Arc<dyn SubteamDirectory>) -> Self {
        self.subteams = Some(directory);
        self
    }

    pub fn with_webhook_store(mut self, store: Arc<dyn WebhookStore>) -> Self {
        self.webhooks = Some(store);
        self
    }

    pub fn build(self) -> Result<AppState, RemoteError> {
        let config = self.config;

        // Redirects from the web app must reach the browser unchanged.
        let client = reqwest::Client::builder()
            .user_agent(concat!("booking-edge/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let edge_config = EdgeConfigClient::new(client.clone(), &config.edge_config)?;
        let edge_config_configured = edge_config.is_configured();
        if !edge_config_configured {
            tracing::info!("Edge config not configured, maintenance mode is off");
        }

        let banlist: Arc<dyn Banlist> = match self.banlist {
            Some(banlist) => banlist,
            None => {
                let banlist = StaticBanlist::from_entries(&config.security.ip_banlist);
                tracing::info!(entries = banlist.len(), "IP banlist loaded");
                Arc::new(banlist)
            }
        };
        let maintenance = self
            .maintenance
            .unwrap_or_else(|| Arc::new(edge_config));
        let subteams = self.subteams.unwrap_or_else(|| {
            Arc::new(HttpSubteamDirectory::new(
                client.clone(),
                &config.urls.webapp_url,
            ))
        });
        let webhooks = self
            .webhooks
            .unwrap_or_else(|| Arc::new(PgWebhookStore::new(self.pool.clone())));

        let rule_chain = RuleChain::standard(RoutingDeps {
            features: config.features.clone(),
            allowed_callback_origins: config.urls.allowed_callback_origins(),
            banlist,
            maintenance,
            subteams,
        });

        let upstream = UpstreamClient::new(client, &config.upstream, config.server.max_body_size)?;

        Ok(AppState {
            pool: self.pool,
            org_domains: Arc::new(OrgDomainResolver::new(&config.organizations)),
            rule_chain: Arc::new(rule_chain),
            webhooks,
            upstream: Arc::new(upstream),
            edge_config_configured,
            config: Arc::new(config),
        })
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut routes: Router<AppState> = Router::new()
        .route("/api/nope", get(nope::nope).post(nope::nope))
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/api/metrics", get(metrics_handler));

    // Internal routes exist only when a token is configured
    if !config.security.internal_api_token.is_empty() {
        let internal_routes = Router::new()
            .route(
                "/api/internal/webhooks/subscribers",
                get(webhooks::list_subscribers),
            )
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_internal_token,
            ));
        routes = routes.merge(internal_routes);
    }

    let router = routes
        .fallback(proxy::forward)
        .layer(middleware::from_fn(metrics_middleware))
        .with_state(state.clone());

    // Rules run before routing so rewrites pick the handler.
    let routed = middleware::from_fn_with_state(state.clone(), route_request).layer(router);

    // Global middleware (order matters: bottom layers run first)
    Router::new()
        .fallback_service(routed)
        .layer(middleware::from_fn_with_state(state, collect_events))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
}
