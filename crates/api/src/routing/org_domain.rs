//! Organization subdomain resolution.

use crate::config::OrganizationsConfig;

/// Organization derived from a request host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgDomain {
    /// Subdomain label under an allowed hostname, if any.
    pub current_org_domain: Option<String>,
    /// Whether the label names an organization.
    pub is_valid_org_domain: bool,
}

impl OrgDomain {
    /// The organization slug when the host is a valid organization domain.
    pub fn valid_org(&self) -> Option<&str> {
        if self.is_valid_org_domain {
            self.current_org_domain.as_deref()
        } else {
            None
        }
    }
}

/// Maps `Host` headers to organizations.
#[derive(Debug, Clone)]
pub struct OrgDomainResolver {
    enabled: bool,
    allowed_hostnames: Vec<String>,
    reserved_subdomains: Vec<String>,
}

impl OrgDomainResolver {
    pub fn new(config: &OrganizationsConfig) -> Self {
        let lower = |values: &[String]| -> Vec<String> {
            values
                .iter()
                .map(|v| v.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|v| !v.is_empty())
                .collect()
        };

        Self {
            enabled: config.enabled,
            allowed_hostnames: lower(&config.allowed_hostnames),
            reserved_subdomains: lower(&config.reserved_subdomains),
        }
    }

    /// Resolve a `Host` header value.
    ///
    /// `acme.cal.com:3000` under allowed hostname `cal.com` yields `acme`.
    /// Nested subdomains (`a.b.cal.com`) and the bare hostname yield nothing.
    pub fn resolve(&self, host: &str) -> OrgDomain {
        let hostname = host
            .split(':')
            .next()
            .unwrap_or_default()
            .trim_end_matches('.')
            .to_ascii_lowercase();

        let slug = self.allowed_hostnames.iter().find_map(|allowed| {
            let label = hostname.strip_suffix(allowed.as_str())?.strip_suffix('.')?;
            (!label.is_empty() && !label.contains('.')).then(|| label.to_string())
        });

        let is_valid_org_domain = self.enabled
            && slug
                .as_ref()
                .is_some_and(|s| !self.reserved_subdomains.contains(s));

        OrgDomain {
            current_org_domain: slug,
            is_valid_org_domain,
        }
    }
}
