//! Request routing: the rule chain applied to every inbound request.

pub mod chain;
pub mod client;
pub mod context;
pub mod org_domain;
pub mod rules;

pub use chain::{RoutingDeps, RuleChain};
pub use context::{rewrite_uri, RoutingContext, RoutingDecision, RuleOutcome};
pub use org_domain::{OrgDomain, OrgDomainResolver};
pub use rules::Rule;
