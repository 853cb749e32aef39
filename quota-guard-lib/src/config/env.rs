use std::str::FromStr;

use crate::config::Config;
use crate::error::{GuardError, Result};

pub const CACHE_DISABLED: &str = "GA4_CACHE_DISABLED";
pub const CACHE_TTL_MS: &str = "GA4_CACHE_TTL_MS";
pub const METADATA_CACHE_TTL_MS: &str = "GA4_METADATA_CACHE_TTL_MS";
pub const MAX_CONCURRENT: &str = "GA4_MAX_CONCURRENT";
pub const RATE_LIMIT_WINDOW_MS: &str = "GA4_RATE_LIMIT_WINDOW_MS";
pub const RATE_LIMIT_MAX: &str = "GA4_RATE_LIMIT_MAX";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(cfg: &mut Config) -> Result<()> {
    apply_overrides_from(cfg, |name| std::env::var(name).ok())
}

/// Apply overrides from any variable source. Unset or blank variables keep
/// the current value.
pub fn apply_overrides_from<F>(cfg: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(CACHE_DISABLED) {
        cfg.cache.disabled = parse_flag(CACHE_DISABLED, &v)?;
    }
    if let Some(v) = get(CACHE_TTL_MS) {
        cfg.cache.default_ttl_ms = parse_num(CACHE_TTL_MS, &v)?;
    }
    if let Some(v) = get(METADATA_CACHE_TTL_MS) {
        cfg.cache.metadata_ttl_ms = parse_num(METADATA_CACHE_TTL_MS, &v)?;
    }
    if let Some(v) = get(MAX_CONCURRENT) {
        cfg.concurrency.max_concurrent = parse_num(MAX_CONCURRENT, &v)?;
    }
    if let Some(v) = get(RATE_LIMIT_WINDOW_MS) {
        cfg.rate_limit.window_ms = parse_num(RATE_LIMIT_WINDOW_MS, &v)?;
    }
    if let Some(v) = get(RATE_LIMIT_MAX) {
        cfg.rate_limit.max = parse_num(RATE_LIMIT_MAX, &v)?;
    }
    Ok(())
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(GuardError::Config(format!("{name}: expected a boolean, got '{other}'"))),
    }
}

fn parse_num<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| GuardError::Config(format!("{name}: invalid value '{value}': {e}")))
}
