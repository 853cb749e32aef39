use quota_guard_lib::error::RateLimitExceeded;
use quota_guard_lib::security::rate_limit::RateGuard;
use std::thread::sleep;
use std::time::{Duration, Instant};

#[test]
fn test_fourth_call_in_window_is_rejected() {
    let guard = RateGuard::new(3, Duration::from_secs(60), None);

    for i in 0..3 {
        assert!(guard.check_limit("t1:p1").is_ok(), "call {} should be allowed", i + 1);
    }

    let err = guard.check_limit("t1:p1").err();
    let Some(err) = err else {
        panic!("4th call should be rate limited");
    };
    assert_eq!(err.code(), "GA4_RATE_LIMIT");
    assert_eq!(err.status().as_u16(), 429);
    assert_eq!(err.limit, 3);
    assert_eq!(guard.current_count("t1:p1"), 3, "rejection must not bump the counter");
}

#[test]
fn test_new_window_resets_count_to_one() {
    let guard = RateGuard::new(3, Duration::from_millis(100), None);
    for _ in 0..3 {
        assert!(guard.check("k").is_allowed());
    }
    assert!(guard.check("k").is_limited());

    sleep(Duration::from_millis(150));

    let result = guard.check("k");
    assert!(result.is_allowed(), "after the window, call should be allowed, got {result:?}");
    assert_eq!(guard.current_count("k"), 1);
    assert_eq!(result.remaining(), 2);
}

#[test]
fn test_disabled_guard_allows_everything() {
    let guard = RateGuard::new(0, Duration::from_secs(60), None);
    assert!(!guard.is_enabled());
    for _ in 0..1000 {
        assert!(guard.check_limit("k").is_ok());
    }
}

#[test]
fn test_keys_are_independent() {
    let guard = RateGuard::new(2, Duration::from_secs(60), None);
    for _ in 0..2 {
        assert!(guard.check("t1:p1").is_allowed());
        assert!(guard.check("t1:p2").is_allowed());
    }
    assert!(guard.check("t1:p1").is_limited());
    assert!(guard.check("t1:p2").is_limited());
    assert!(guard.check("t2:p1").is_allowed());
}

#[test]
fn test_remaining_count_decreases() {
    let guard = RateGuard::new(5, Duration::from_secs(60), None);
    for i in 0..5u32 {
        let result = guard.check("k");
        assert_eq!(result.remaining(), 5 - i - 1);
        assert_eq!(result.limit(), 5);
    }
    assert_eq!(guard.check("k").remaining(), 0);
}

#[test]
fn test_explicit_clock_window_boundary() {
    let guard = RateGuard::new(1, Duration::from_secs(1), None);
    let start = Instant::now();

    assert!(guard.check_at("k", start).is_allowed());
    assert!(guard.check_at("k", start + Duration::from_millis(999)).is_limited());
    assert!(guard.check_at("k", start + Duration::from_secs(1)).is_allowed());
}

#[test]
fn test_purge_stale_counters() {
    let guard = RateGuard::new(5, Duration::from_millis(20), None);
    guard.check("a");
    guard.check("b");
    assert_eq!(guard.tracked_keys(), 2);

    sleep(Duration::from_millis(40));
    guard.check("c");

    assert_eq!(guard.purge_stale(), 2);
    assert_eq!(guard.tracked_keys(), 1);
}

#[test]
fn test_error_message_names_the_key() {
    let err = RateLimitExceeded {
        key: "t1:p1".to_string(),
        limit: 3,
        retry_after: Duration::from_secs(1),
    };
    assert!(err.to_string().contains("t1:p1"));
}
