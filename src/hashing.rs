//! Quote Fingerprints - SHA-256 over Canonical JSON
//!
//! A cart line stores the hash of the quote that priced it, so the storefront
//! can detect a stale price after a catalog refresh.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

/// SHA-256 of bytes as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let sorted_map: serde_json::Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_value(v)))
                .collect();
            Value::Object(sorted_map)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// quote_hash = sha256(request : attributes : total : engine_version)
///
/// The total is fixed to six decimals so float formatting cannot move it.
pub fn compute_quote_hash(
    request: &impl Serialize,
    attributes: &impl Serialize,
    total: f64,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let combined = format!(
        "{}:{}:{:.6}:{}",
        canonical_json(request)?,
        canonical_json(attributes)?,
        total,
        engine_version
    );
    Ok(sha256_hex(combined.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": {"y": 1, "b": 2}});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":{"b":2,"y":1},"z":1}"#);
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_quote_hash_sensitive_to_total() {
        let request = json!({"productId": "doc-print"});
        let attrs = json!([{"valueName": "A4"}]);
        let h1 = compute_quote_hash(&request, &attrs, 100.0, "1.0.0").unwrap();
        let h2 = compute_quote_hash(&request, &attrs, 100.0, "1.0.0").unwrap();
        let h3 = compute_quote_hash(&request, &attrs, 100.5, "1.0.0").unwrap();
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }
}
