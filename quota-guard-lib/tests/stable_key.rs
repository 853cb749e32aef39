use quota_guard_lib::cache::{hash_value, stable_stringify, CacheKey};
use serde_json::json;

#[test]
fn test_hash_is_deterministic() {
    let value = json!({"metrics": ["sessions"], "dateRanges": [{"startDate": "7daysAgo"}]});
    let first = hash_value(&value);
    for _ in 0..10 {
        assert_eq!(hash_value(&value), first);
    }
}

#[test]
fn test_object_key_order_is_ignored() {
    assert_eq!(stable_stringify(&json!({"a": 1, "b": 2})), stable_stringify(&json!({"b": 2, "a": 1})));
    assert_eq!(stable_stringify(&json!({"a": 1, "b": 2})), r#"{"a":1,"b":2}"#);
}

#[test]
fn test_array_order_is_significant() {
    assert_ne!(stable_stringify(&json!([1, 2])), stable_stringify(&json!([2, 1])));
    assert_ne!(hash_value(&json!([1, 2])), hash_value(&json!([2, 1])));
}

#[test]
fn test_nested_objects_inside_arrays_are_normalized() {
    let a = json!([{"x": 1, "y": {"q": true, "p": null}}]);
    let b = json!([{"y": {"p": null, "q": true}, "x": 1}]);
    assert_eq!(hash_value(&a), hash_value(&b));
}

#[test]
fn test_same_payload_different_key_order_same_cache_key() {
    let first = CacheKey::report("t1", Some("p1"), &json!({"metrics": ["sessions"], "dimensions": []}));
    let reordered =
        CacheKey::report("t1", Some("p1"), &json!({"dimensions": [], "metrics": ["sessions"]}));
    let different = CacheKey::report("t1", Some("p1"), &json!({"metrics": ["sessions", "users"]}));

    assert_eq!(first, reordered);
    assert_ne!(first, different);
}

#[test]
fn test_tenant_and_resource_are_part_of_the_key() {
    let payload = json!({"metrics": ["sessions"]});
    let base = CacheKey::report("t1", Some("p1"), &payload);

    assert_ne!(base, CacheKey::report("t2", Some("p1"), &payload));
    assert_ne!(base, CacheKey::report("t1", Some("p2"), &payload));
    assert_eq!(base.as_str(), format!("ga4:report:t1:p1:{}", hash_value(&payload)));
}
