//! Fixed-window rate limiting for calls to the external reporting API.
//!
//! # Architecture
//!
//! 1. **FixedWindow** (`window.rs`): one `{count, reset_at}` counter per key.
//!    The counter restarts at 1 on the first call at or after `reset_at`.
//!
//! 2. **RateGuard** (`limiter.rs`): applies the per-window maximum on top of
//!    the counters and reports either a [`RateLimitResult`] or a
//!    [`crate::error::RateLimitExceeded`] error.
//!
//! Windows are fixed, not sliding: a key can pass close to `2 * max` calls
//! around a window boundary. A maximum of 0 disables the guard.
//!
//! # Example Usage
//!
//! ```ignore
//! use quota_guard_lib::security::rate_limit::RateGuard;
//! use std::time::Duration;
//!
//! // 60 calls per key per minute
//! let guard = RateGuard::new(60, Duration::from_secs(60), None);
//!
//! // Surfaces as HTTP 429 with code GA4_RATE_LIMIT at the API boundary
//! guard.check_limit("tenant-1:properties/123")?;
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [rate_limit]
//! window_ms = 60000
//! max = 60
//! ```

mod limiter;
mod window;

pub use limiter::{RateGuard, RateLimitResult};
pub use window::{FixedWindow, Observation};
