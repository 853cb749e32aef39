use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::key::{METADATA_NAMESPACE, REPORT_NAMESPACE};
use super::TtlCache;
use crate::config::CacheConfig;

/// The two cache tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    /// Report results, short TTL
    Report,
    /// Resource metadata, long TTL
    Metadata,
}

impl CacheTier {
    pub fn namespace(self) -> &'static str {
        match self {
            CacheTier::Report => REPORT_NAMESPACE,
            CacheTier::Metadata => METADATA_NAMESPACE,
        }
    }
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheTier::Report => f.write_str("report"),
            CacheTier::Metadata => f.write_str("metadata"),
        }
    }
}

impl FromStr for CacheTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "report" => Ok(CacheTier::Report),
            "metadata" => Ok(CacheTier::Metadata),
            other => Err(format!("unknown cache tier '{other}' (expected report or metadata)")),
        }
    }
}

/// Report and metadata caches sharing one disable switch.
pub struct TieredCache {
    report: TtlCache<Value>,
    metadata: TtlCache<Value>,
}

impl TieredCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            report: TtlCache::new(config.report_ttl()).with_disabled(config.disabled),
            metadata: TtlCache::new(config.metadata_ttl()).with_disabled(config.disabled),
        }
    }

    pub fn report(&self) -> &TtlCache<Value> {
        &self.report
    }

    pub fn metadata(&self) -> &TtlCache<Value> {
        &self.metadata
    }

    pub fn tier(&self, tier: CacheTier) -> &TtlCache<Value> {
        match tier {
            CacheTier::Report => &self.report,
            CacheTier::Metadata => &self.metadata,
        }
    }

    /// Purge expired entries from both tiers.
    pub fn purge_expired(&self) -> usize {
        self.report.purge_expired().saturating_add(self.metadata.purge_expired())
    }
}
