//! IP banlist lookup.

use std::collections::HashSet;
use std::net::IpAddr;

/// Decides whether a client address is banned.
pub trait Banlist: Send + Sync {
    fn is_banned(&self, ip: IpAddr) -> bool;
}

/// Banlist backed by a fixed set of addresses from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticBanlist {
    ips: HashSet<IpAddr>,
}

impl StaticBanlist {
    /// Build from configured entries. Invalid entries are logged and skipped.
    pub fn from_entries(entries: &[String]) -> Self {
        let ips = entries
            .iter()
            .map(|entry| entry.trim())
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match entry.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!(entry = %entry, "Ignoring invalid banlist entry");
                    None
                }
            })
            .collect();

        Self { ips }
    }

    pub fn len(&self) -> usize {
        self.ips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ips.is_empty()
    }
}

impl Banlist for StaticBanlist {
    fn is_banned(&self, ip: IpAddr) -> bool {
        self.ips.contains(&ip)
    }
}
