//! High-level rate guard.
//!
//! Wraps the [`FixedWindow`] counters with the per-window maximum and the
//! result and error types callers act on.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use super::window::{FixedWindow, Observation};
use crate::config::RateLimitConfig;
use crate::error::RateLimitExceeded;
use crate::telemetry::Metrics;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Call is allowed to proceed.
    Allowed {
        /// Maximum number of calls allowed in the window
        limit: u32,
        /// Number of calls remaining in the current window
        remaining: u32,
    },
    /// Call is rate limited and should be rejected.
    Limited {
        /// Maximum number of calls allowed in the window
        limit: u32,
        /// Number of calls remaining (always 0)
        remaining: u32,
        /// Time until the window resets
        reset_after: Duration,
    },
}

impl RateLimitResult {
    /// Returns true if the call is allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }

    /// Returns true if the call is limited.
    pub fn is_limited(&self) -> bool {
        matches!(self, RateLimitResult::Limited { .. })
    }

    /// Get the limit value.
    pub fn limit(&self) -> u32 {
        match self {
            RateLimitResult::Allowed { limit, .. } => *limit,
            RateLimitResult::Limited { limit, .. } => *limit,
        }
    }

    /// Get the remaining count.
    pub fn remaining(&self) -> u32 {
        match self {
            RateLimitResult::Allowed { remaining, .. } => *remaining,
            RateLimitResult::Limited { remaining, .. } => *remaining,
        }
    }

    /// Get the reset duration if limited.
    pub fn reset_after(&self) -> Option<Duration> {
        match self {
            RateLimitResult::Limited { reset_after, .. } => Some(*reset_after),
            _ => None,
        }
    }

    /// Turn a limited result into the error surfaced to callers.
    pub fn into_result(self, key: &str) -> Result<(), RateLimitExceeded> {
        match self {
            RateLimitResult::Allowed { .. } => Ok(()),
            RateLimitResult::Limited { limit, reset_after, .. } => {
                Err(RateLimitExceeded { key: key.to_string(), limit, retry_after: reset_after })
            }
        }
    }
}

/// Enforces a maximum number of calls per key within fixed time windows.
///
/// # Example
/// ```ignore
/// use std::time::Duration;
/// use quota_guard_lib::security::rate_limit::{RateGuard, RateLimitResult};
///
/// let guard = RateGuard::new(3, Duration::from_secs(1), None);
///
/// match guard.check("tenant-1:properties/123") {
///     RateLimitResult::Allowed { remaining, .. } => {
///         println!("Call allowed, {} remaining", remaining);
///     }
///     RateLimitResult::Limited { reset_after, .. } => {
///         println!("Rate limited, retry after {:?}", reset_after);
///     }
/// }
/// ```
pub struct RateGuard {
    window: FixedWindow,
    max_requests: u32,
    metrics: Option<Arc<Metrics>>,
}

impl RateGuard {
    /// Create a new rate guard.
    ///
    /// # Parameters
    /// - `max_requests`: Calls allowed per key within one window, 0 disables the guard
    /// - `window`: Length of one window
    /// - `metrics`: Optional counters for allowed and rejected calls
    pub fn new(max_requests: u32, window: Duration, metrics: Option<Arc<Metrics>>) -> Self {
        Self { window: FixedWindow::new(window), max_requests, metrics }
    }

    pub fn from_config(config: &RateLimitConfig, metrics: Option<Arc<Metrics>>) -> Self {
        Self::new(config.max, config.window(), metrics)
    }

    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }

    /// Record a call for `key` and report whether it may proceed.
    pub fn check(&self, key: &str) -> RateLimitResult {
        self.check_at(key, Instant::now())
    }

    /// [`RateGuard::check`] against an explicit clock reading.
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitResult {
        if !self.is_enabled() {
            return RateLimitResult::Allowed { limit: u32::MAX, remaining: u32::MAX };
        }

        let result = match self.window.observe_at(key, self.max_requests, now) {
            Observation::Counted { count, .. } => RateLimitResult::Allowed {
                limit: self.max_requests,
                remaining: self.max_requests.saturating_sub(count),
            },
            Observation::Exhausted { reset_at, .. } => {
                let reset_after = reset_at.saturating_duration_since(now);
                warn!(
                    key,
                    limit = self.max_requests,
                    reset_after_ms = millis(reset_after),
                    "rate limit exceeded"
                );
                RateLimitResult::Limited { limit: self.max_requests, remaining: 0, reset_after }
            }
        };

        if let Some(m) = &self.metrics {
            m.record_rate_limit(result.is_allowed());
        }
        result
    }

    /// Permit the call or fail with [`RateLimitExceeded`] (HTTP 429).
    pub fn check_limit(&self, key: &str) -> Result<(), RateLimitExceeded> {
        self.check(key).into_result(key)
    }

    /// Calls recorded for `key` in its current window.
    pub fn current_count(&self, key: &str) -> u32 {
        self.window.count_at(key, Instant::now())
    }

    /// Get the configured maximum calls per window.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Get the configured window duration.
    pub fn window(&self) -> Duration {
        self.window.window()
    }

    /// Number of keys with a counter.
    pub fn tracked_keys(&self) -> usize {
        self.window.len()
    }

    /// Remove counters whose window already ended. Never called implicitly.
    pub fn purge_stale(&self) -> usize {
        self.window.purge_stale_at(Instant::now())
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_result_reports_time_to_reset() {
        let guard = RateGuard::new(1, Duration::from_secs(10), None);
        let start = Instant::now();
        assert!(guard.check_at("k", start).is_allowed());

        let result = guard.check_at("k", start + Duration::from_secs(4));
        assert_eq!(result.reset_after(), Some(Duration::from_secs(6)));
        assert_eq!(result.remaining(), 0);
    }

    #[test]
    fn into_result_builds_the_error() {
        let limited =
            RateLimitResult::Limited { limit: 3, remaining: 0, reset_after: Duration::from_secs(2) };
        let err = limited.into_result("t1:p1").err();
        assert_eq!(
            err,
            Some(RateLimitExceeded {
                key: "t1:p1".to_string(),
                limit: 3,
                retry_after: Duration::from_secs(2),
            })
        );
    }

    #[test]
    fn log_millis_saturate_instead_of_wrapping() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn huge_window_still_limits() {
        let guard = RateGuard::new(1, Duration::MAX, None);
        let start = Instant::now();
        assert!(guard.check_at("k", start).is_allowed());
        let result = guard.check_at("k", start + Duration::from_secs(1));
        assert!(result.is_limited());
        assert!(result.reset_after().is_some_and(|d| d > Duration::from_secs(3600)));
    }

    #[test]
    fn disabled_guard_keeps_no_counters() {
        let guard = RateGuard::new(0, Duration::from_secs(1), None);
        assert!(guard.check("k").is_allowed());
        assert_eq!(guard.tracked_keys(), 0);
    }
}
