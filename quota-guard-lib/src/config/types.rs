use serde::Deserialize;
use std::time::Duration;

/// Top-level quota guard configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level used when RUST_LOG is not set
    /// Default: "info"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Include the event target in log lines
    #[serde(default)]
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), show_target: false }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Response cache configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CacheConfig {
    /// Bypass caching entirely
    /// Default: false
    #[serde(default)]
    pub disabled: bool,
    /// TTL of report results in milliseconds, 0 never expires
    /// Default: 120000 (2 minutes)
    #[serde(default = "default_report_ttl_ms")]
    pub default_ttl_ms: u64,
    /// TTL of resource metadata in milliseconds, 0 never expires
    /// Default: 86400000 (24 hours)
    #[serde(default = "default_metadata_ttl_ms")]
    pub metadata_ttl_ms: u64,
}

impl CacheConfig {
    pub fn report_ttl(&self) -> Option<Duration> {
        ttl_from_ms(self.default_ttl_ms)
    }

    pub fn metadata_ttl(&self) -> Option<Duration> {
        ttl_from_ms(self.metadata_ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            default_ttl_ms: default_report_ttl_ms(),
            metadata_ttl_ms: default_metadata_ttl_ms(),
        }
    }
}

fn ttl_from_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn default_report_ttl_ms() -> u64 {
    120_000
}

fn default_metadata_ttl_ms() -> u64 {
    86_400_000
}

/// Per-resource concurrency configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ConcurrencyConfig {
    /// Maximum in-flight external calls per resource id
    /// Default: 5
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self { max_concurrent: default_max_concurrent() }
    }
}

fn default_max_concurrent() -> usize {
    5
}

/// Fixed-window rate limiting configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Window length in milliseconds
    /// Default: 60000 (1 minute)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Maximum calls per key within one window, 0 disables rate limiting
    /// Default: 60
    #[serde(default = "default_max_calls")]
    pub max: u32,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn is_enabled(&self) -> bool {
        self.max > 0
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { window_ms: default_window_ms(), max: default_max_calls() }
    }
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_max_calls() -> u32 {
    60
}
