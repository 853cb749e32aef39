//! The quota guard in front of the external reporting API.
//!
//! A call goes through four stages:
//!
//! 1. derive the [`CacheKey`] from tenant, resource and payload,
//! 2. answer from the cache tier when the key is fresh,
//! 3. otherwise take a concurrency slot for the resource,
//! 4. pass the rate guard, call the API and cache the result.
//!
//! Errors from the API call are returned untouched and never cached.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::cache::{CacheKey, CacheTier, TieredCache, GLOBAL_RESOURCE};
use crate::config::Config;
use crate::error::RateLimitExceeded;
use crate::limiter::ConcurrencyLimiter;
use crate::security::RateGuard;
use crate::telemetry::Metrics;

/// A report request as seen by the guard.
#[derive(Debug, Clone, Copy)]
pub struct ReportRequest<'a> {
    pub tenant_id: &'a str,
    /// External resource, e.g. a GA4 property id. `None` shares the global group.
    pub resource_id: Option<&'a str>,
    pub payload: &'a Value,
}

impl<'a> ReportRequest<'a> {
    pub fn new(tenant_id: &'a str, resource_id: Option<&'a str>, payload: &'a Value) -> Self {
        Self { tenant_id, resource_id, payload }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::report(self.tenant_id, self.resource_id, self.payload)
    }

    pub fn rate_key(&self) -> String {
        rate_key(self.tenant_id, self.resource_id)
    }
}

fn rate_key(tenant_id: &str, resource_id: Option<&str>) -> String {
    format!("{tenant_id}:{}", resource_id.unwrap_or(GLOBAL_RESOURCE))
}

/// Cache, concurrency limiter and rate guard composed around external calls.
pub struct QuotaGuard {
    cache: TieredCache,
    limiter: ConcurrencyLimiter,
    rate_guard: RateGuard,
    metrics: Option<Arc<Metrics>>,
}

impl QuotaGuard {
    pub fn new(config: &Config, metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            cache: TieredCache::new(&config.cache),
            limiter: ConcurrencyLimiter::from_config(&config.concurrency, metrics.clone()),
            rate_guard: RateGuard::from_config(&config.rate_limit, metrics.clone()),
            metrics,
        }
    }

    pub fn cache(&self) -> &TieredCache {
        &self.cache
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    pub fn rate_guard(&self) -> &RateGuard {
        &self.rate_guard
    }

    /// Serve a report from the report tier, or fetch it under the limits.
    pub async fn run_report<F, Fut, E>(&self, request: &ReportRequest<'_>, fetch: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: From<RateLimitExceeded>,
    {
        self.run_tier(
            CacheTier::Report,
            request.cache_key(),
            request.rate_key(),
            request.resource_id,
            fetch,
        )
        .await
    }

    /// Serve resource metadata from the metadata tier, or fetch it under the limits.
    pub async fn run_metadata<F, Fut, E>(
        &self,
        tenant_id: &str,
        resource_id: Option<&str>,
        fetch: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: From<RateLimitExceeded>,
    {
        self.run_tier(
            CacheTier::Metadata,
            CacheKey::metadata(tenant_id, resource_id),
            rate_key(tenant_id, resource_id),
            resource_id,
            fetch,
        )
        .await
    }

    async fn run_tier<F, Fut, E>(
        &self,
        tier: CacheTier,
        key: CacheKey,
        rate_key: String,
        resource_id: Option<&str>,
        fetch: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: From<RateLimitExceeded>,
    {
        let cache = self.cache.tier(tier);
        let tier_name = tier.to_string();

        if let Some(hit) = cache.get(key.as_str()) {
            debug!(%key, tier = %tier_name, "cache hit");
            if let Some(m) = &self.metrics {
                m.record_cache_lookup(&tier_name, true);
            }
            return Ok(hit);
        }
        if let Some(m) = &self.metrics {
            m.record_cache_lookup(&tier_name, false);
        }
        debug!(%key, tier = %tier_name, "cache miss");

        self.limiter
            .with_limit(resource_id, || async {
                self.rate_guard.check_limit(&rate_key)?;

                let started = Instant::now();
                let outcome = fetch().await;
                if let Some(m) = &self.metrics {
                    m.record_external_call(
                        &tier_name,
                        started.elapsed().as_secs_f64(),
                        outcome.is_ok(),
                    );
                }

                let value = outcome?;
                Ok::<Value, E>(cache.set_default(key.into_string(), value))
            })
            .await
    }
}
