use quota_guard_lib::cache::TtlCache;
use std::thread::sleep;
use std::time::Duration;

#[test]
fn test_entry_expires_after_ttl() {
    let cache = TtlCache::new(None);
    cache.set("k", "v", Some(Duration::from_millis(50)));
    assert_eq!(cache.get("k"), Some("v"));
    assert_eq!(cache.len(), 1);

    sleep(Duration::from_millis(80));

    assert_eq!(cache.get("k"), None);
    assert_eq!(cache.len(), 0, "expired entry should be evicted on read");
}

#[test]
fn test_expired_entry_stays_until_read() {
    let cache = TtlCache::new(None);
    cache.set("a", 1, Some(Duration::from_millis(10)));
    cache.set("b", 2, Some(Duration::from_millis(10)));
    sleep(Duration::from_millis(30));

    // No background sweep
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_set_returns_the_value() {
    let cache = TtlCache::new(Some(Duration::from_secs(60)));
    assert_eq!(cache.set_default("k", 42), 42);
    assert_eq!(cache.get("k"), Some(42));
}

#[test]
fn test_disabled_cache_never_returns_values() {
    let cache = TtlCache::new(Some(Duration::from_secs(60))).with_disabled(true);
    assert!(cache.is_disabled());

    for i in 0..5 {
        assert_eq!(cache.set(format!("k{i}"), i, None), i);
        assert_eq!(cache.get(&format!("k{i}")), None);
    }
    assert!(cache.is_empty());
}

#[test]
fn test_last_writer_wins() {
    let cache = TtlCache::new(None);
    cache.set("k", 1, None);
    cache.set("k", 2, None);
    assert_eq!(cache.get("k"), Some(2));
}
