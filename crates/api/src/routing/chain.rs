//! Ordered evaluation of routing rules.

use std::sync::Arc;

use metrics::counter;

use crate::config::FeaturesConfig;
use crate::routing::context::{RoutingContext, RoutingDecision, RuleOutcome};
use crate::routing::rules::{
    AbuseGuard, CspEnforceHeader, EmbedParamRedirect, IpBanlistGuard, MaintenanceGate,
    NewBookerToggle, OrgRootRewrite, OrgSubteamRewrite, Rule, RoutingFormsRename, TimezoneHeader,
};
use crate::services::{Banlist, MaintenanceFlagSource, SubteamDirectory};

/// Collaborators of the standard rule set.
#[derive(Clone)]
pub struct RoutingDeps {
    pub features: FeaturesConfig,
    pub allowed_callback_origins: Vec<String>,
    pub banlist: Arc<dyn Banlist>,
    pub maintenance: Arc<dyn MaintenanceFlagSource>,
    pub subteams: Arc<dyn SubteamDirectory>,
}

/// Rules evaluated in registration order; the first decision wins.
#[derive(Default)]
pub struct RuleChain {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The production rule set.
    pub fn standard(deps: RoutingDeps) -> Self {
        let mut chain = Self::new();
        chain.register(NewBookerToggle {
            for_non_embed: deps.features.new_booker_enabled_for_non_embed,
            for_embed: deps.features.new_booker_enabled_for_embed,
        });
        chain.register(OrgRootRewrite);
        chain.register(IpBanlistGuard {
            banlist: Arc::clone(&deps.banlist),
        });
        chain.register(MaintenanceGate {
            source: deps.maintenance,
        });
        chain.register(AbuseGuard {
            banlist: deps.banlist,
            allowed_origins: deps.allowed_callback_origins,
        });
        chain.register(EmbedParamRedirect);
        chain.register(RoutingFormsRename);
        chain.register(TimezoneHeader);
        chain.register(CspEnforceHeader);
        chain.register(OrgSubteamRewrite {
            directory: deps.subteams,
        });
        chain
    }

    /// Append a rule to the chain.
    pub fn register<R: Rule + 'static>(&mut self, rule: R) {
        self.rules.push(Arc::new(rule));
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Run the rules over `ctx`.
    ///
    /// Returns [`RoutingDecision::Next`] when no rule decides; changes made
    /// by non-terminal rules stay on `ctx`.
    pub async fn evaluate(&self, ctx: &mut RoutingContext) -> RoutingDecision {
        for rule in &self.rules {
            if let RuleOutcome::Decide(decision) = rule.apply(ctx).await {
                tracing::debug!(
                    rule = rule.name(),
                    decision = decision.kind(),
                    path = %ctx.path(),
                    "Routing decision"
                );
                record_decision(rule.name(), decision.kind());
                return decision;
            }
        }

        record_decision("default", RoutingDecision::Next.kind());
        RoutingDecision::Next
    }
}

fn record_decision(rule: &'static str, decision: &'static str) {
    counter!(
        "routing_decisions_total",
        "rule" => rule,
        "decision" => decision
    )
    .increment(1);
}
