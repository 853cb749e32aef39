use std::fmt;

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::CacheTier;

/// Namespace of the short-lived report result tier.
pub const REPORT_NAMESPACE: &str = "ga4:report";
/// Namespace of the long-lived resource metadata tier.
pub const METADATA_NAMESPACE: &str = "ga4:metadata";
/// Resource id used when the caller does not name one.
pub const GLOBAL_RESOURCE: &str = "global";

// 8 bytes of digest, 16 hex characters
const HASH_BYTES: usize = 8;

/// Render `value` in a canonical textual form.
///
/// Object keys are sorted so that structurally equal values produce the same
/// output regardless of insertion order. Array order is kept. `null` renders
/// as the empty token.
pub fn stable_stringify(value: &Value) -> String {
    let mut out = String::new();
    write_stable(value, &mut out);
    out
}

fn write_stable(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_json_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_stable(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(key, out);
                out.push(':');
                if let Some(v) = map.get(key) {
                    write_stable(v, out);
                }
            }
            out.push('}');
        }
    }
}

fn write_json_string(s: &str, out: &mut String) {
    // Serializing a plain str into JSON cannot fail.
    out.push_str(&serde_json::to_string(s).unwrap_or_default());
}

/// SHA-256 of the canonical form, hex encoded and truncated to 16 characters.
pub fn hash_value(value: &Value) -> String {
    let digest = Sha256::digest(stable_stringify(value).as_bytes());
    hex::encode(&digest[..HASH_BYTES])
}

/// Cache key of the form `{namespace}:{tenant}:{resource}:{payload hash}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(
        namespace: &str,
        tenant_id: &str,
        resource_id: Option<&str>,
        payload: &Value,
    ) -> Self {
        let resource = resource_id.unwrap_or(GLOBAL_RESOURCE);
        Self(format!("{namespace}:{tenant_id}:{resource}:{}", hash_value(payload)))
    }

    pub fn for_tier(
        tier: CacheTier,
        tenant_id: &str,
        resource_id: Option<&str>,
        payload: &Value,
    ) -> Self {
        Self::new(tier.namespace(), tenant_id, resource_id, payload)
    }

    /// Key for a report request in the short-lived tier.
    pub fn report(tenant_id: &str, resource_id: Option<&str>, payload: &Value) -> Self {
        Self::new(REPORT_NAMESPACE, tenant_id, resource_id, payload)
    }

    /// Key for resource metadata in the long-lived tier. Metadata lookups carry no payload.
    pub fn metadata(tenant_id: &str, resource_id: Option<&str>) -> Self {
        Self::new(METADATA_NAMESPACE, tenant_id, resource_id, &Value::Null)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitives_render_as_json_literals() {
        assert_eq!(stable_stringify(&json!(null)), "");
        assert_eq!(stable_stringify(&json!(true)), "true");
        assert_eq!(stable_stringify(&json!(42)), "42");
        assert_eq!(stable_stringify(&json!(1.5)), "1.5");
        assert_eq!(stable_stringify(&json!("a\"b")), r#""a\"b""#);
    }

    #[test]
    fn object_keys_are_sorted_recursively() {
        let value = json!({"b": {"z": 1, "y": [2, 1]}, "a": null});
        assert_eq!(stable_stringify(&value), r#"{"a":,"b":{"y":[2,1],"z":1}}"#);
    }

    #[test]
    fn nested_null_renders_as_empty_token() {
        assert_eq!(stable_stringify(&json!([null])), "[]");
        assert_eq!(stable_stringify(&json!([null, 1])), "[,1]");
        assert_eq!(stable_stringify(&json!({"a": null})), r#"{"a":}"#);
        assert_eq!(hash_value(&json!([null])), hash_value(&json!([])));
    }

    #[test]
    fn hash_is_sixteen_lowercase_hex_chars() {
        let hash = hash_value(&json!({"metrics": ["sessions"]}));
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_matches_truncated_sha256_of_stable_form() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb924...
        assert_eq!(hash_value(&json!(null)), "e3b0c44298fc1c14");
    }

    #[test]
    fn missing_resource_falls_back_to_global() {
        let key = CacheKey::report("t1", None, &json!({}));
        assert!(key.as_str().starts_with("ga4:report:t1:global:"));
    }

    #[test]
    fn report_and_metadata_keys_never_share_a_namespace() {
        let report = CacheKey::report("t1", Some("p1"), &json!(null));
        let metadata = CacheKey::metadata("t1", Some("p1"));
        assert_ne!(report, metadata);
        assert!(metadata.to_string().starts_with("ga4:metadata:t1:p1:"));
    }
}
