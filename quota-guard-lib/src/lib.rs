#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod error;
pub mod guard;
pub mod limiter;
pub mod security;
pub mod telemetry;

mod sync;

pub use cache::{hash_value, stable_stringify, CacheKey, TieredCache, TtlCache};
pub use config::{load_from_env, load_from_path, Config};
pub use error::{GuardError, RateLimitExceeded, Result};
pub use guard::{QuotaGuard, ReportRequest};
pub use limiter::{ConcurrencyLimiter, SlotGuard};
pub use security::rate_limit::{RateGuard, RateLimitResult};
