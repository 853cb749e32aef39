//! Per-resource concurrency limiting for calls to a quota-constrained API.
//!
//! The external reporting API caps how many requests may be in flight for a
//! single resource (a GA4 property). [`ConcurrencyLimiter`] enforces that cap
//! per resource id:
//!
//! - Below the cap a caller gets a [`SlotGuard`] immediately.
//! - At the cap the caller is parked in a FIFO queue as a oneshot waiter.
//! - Dropping a [`SlotGuard`] hands the slot straight to the oldest waiter,
//!   so a newly arriving caller can never overtake a queued one.
//!
//! The slot is released on every exit path, including errors and panics,
//! because release lives in `Drop`.
//!
//! # Example
//!
//! ```ignore
//! use quota_guard_lib::limiter::ConcurrencyLimiter;
//!
//! let limiter = ConcurrencyLimiter::new(5, None);
//! let rows = limiter
//!     .with_limit(Some("properties/123"), || async { fetch_report().await })
//!     .await?;
//! ```

mod guard;
mod queue;

pub use guard::SlotGuard;
pub use queue::ConcurrencyLimiter;
