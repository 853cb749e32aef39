//! Response caching for the external reporting API.
//!
//! Two pieces live here:
//!
//! 1. **Key derivation** (`key.rs`): a canonical JSON rendering that ignores
//!    object key order, hashed with SHA-256 and truncated to 16 hex chars, so
//!    logically equal request payloads map onto the same [`CacheKey`].
//!
//! 2. **TTL storage** (`ttl.rs`, `tiered.rs`): an in-memory map with lazy,
//!    per-entry expiry. [`TieredCache`] holds the short-lived report tier and
//!    the long-lived metadata tier side by side, in disjoint namespaces.
//!
//! # Example
//!
//! ```ignore
//! use quota_guard_lib::cache::{CacheKey, TtlCache};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! let cache = TtlCache::new(Some(Duration::from_secs(120)));
//! let key = CacheKey::report("tenant-1", Some("properties/123"), &json!({"metrics": ["sessions"]}));
//!
//! if cache.get(key.as_str()).is_none() {
//!     cache.set_default(key.as_str(), json!({"rows": []}));
//! }
//! ```

mod key;
mod tiered;
mod ttl;

pub use key::{
    hash_value, stable_stringify, CacheKey, GLOBAL_RESOURCE, METADATA_NAMESPACE, REPORT_NAMESPACE,
};
pub use tiered::{CacheTier, TieredCache};
pub use ttl::TtlCache;
