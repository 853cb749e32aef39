use ahash::AHashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::sync::lock_or_recover;

struct CacheEntry<V> {
    value: V,
    /// `None` never expires
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if now >= at)
    }
}

/// In-memory cache with per-entry time-to-live.
///
/// Expiry is lazy: an expired entry stays in the map until a `get` for its key
/// (or an explicit [`TtlCache::purge_expired`]) evicts it. There is no
/// background sweep.
///
/// A disabled cache never stores anything: `get` always misses and `set` only
/// hands the value back.
pub struct TtlCache<V> {
    entries: Mutex<AHashMap<String, CacheEntry<V>>>,
    default_ttl: Option<Duration>,
    disabled: bool,
}

impl<V: Clone> TtlCache<V> {
    /// Create an enabled cache. A `None` or zero `default_ttl` means entries
    /// written through [`TtlCache::set_default`] never expire.
    pub fn new(default_ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(AHashMap::new()),
            default_ttl: default_ttl.filter(|ttl| !ttl.is_zero()),
            disabled: false,
        }
    }

    /// Switch the cache off (or back on).
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Look up `key`, evicting the entry if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        if self.disabled {
            return None;
        }
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Store `value` under `key`, replacing any previous entry, and return it.
    ///
    /// A `None` or zero `ttl` stores the entry without expiry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) -> V {
        if self.disabled {
            return value;
        }
        // An unrepresentable deadline is as good as never.
        let expires_at = ttl
            .filter(|ttl| !ttl.is_zero())
            .and_then(|ttl| Instant::now().checked_add(ttl));
        self.lock()
            .insert(key.into(), CacheEntry { value: value.clone(), expires_at });
        value
    }

    /// [`TtlCache::set`] with the cache's default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: V) -> V {
        self.set(key, value, self.default_ttl)
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.lock().remove(key).map(|entry| entry.value)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry now. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(entries.len())
    }

    fn lock(&self) -> MutexGuard<'_, AHashMap<String, CacheEntry<V>>> {
        lock_or_recover(&self.entries, "ttl_cache")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn zero_ttl_never_expires() {
        let cache = TtlCache::new(None);
        cache.set("k", 1, Some(Duration::ZERO));
        sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), Some(1));
    }

    #[test]
    fn zero_default_ttl_is_normalized_to_none() {
        let cache: TtlCache<u8> = TtlCache::new(Some(Duration::ZERO));
        assert_eq!(cache.default_ttl(), None);
    }

    #[test]
    fn set_overwrites_value_and_expiry() {
        let cache = TtlCache::new(None);
        cache.set("k", "old", Some(Duration::from_millis(10)));
        cache.set("k", "new", None);
        sleep(Duration::from_millis(20));
        assert_eq!(cache.get("k"), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn huge_ttl_does_not_overflow() {
        let cache = TtlCache::new(None);
        cache.set("k", 7, Some(Duration::MAX));
        assert_eq!(cache.get("k"), Some(7));
    }

    #[test]
    fn purge_removes_only_expired_entries() {
        let cache = TtlCache::new(None);
        cache.set("short", 1, Some(Duration::from_millis(10)));
        cache.set("long", 2, Some(Duration::from_secs(60)));
        cache.set("forever", 3, None);
        sleep(Duration::from_millis(30));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[test]
    fn remove_and_clear() {
        let cache = TtlCache::new(None);
        cache.set("a", 1, None);
        cache.set("b", 2, None);
        assert_eq!(cache.remove("a"), Some(1));
        assert_eq!(cache.remove("a"), None);
        cache.clear();
        assert!(cache.is_empty());
    }
}
