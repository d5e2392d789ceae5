//! Structural content hashing for dedup
//!
//! The preference service offers no per-record primary key that is
//! stable across chunk dimensions, so records are identified by a
//! SHA-256 digest of their full structural content. Object keys are
//! visited in sorted order and every value is type-tagged before
//! hashing, so two structurally identical records hash identically no
//! matter what order their fields were serialized in transit. The
//! digest is used exclusively for dedup, never as a display identifier.

use crate::domain::{PreferenceRecord, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex digest of a record's structural content
pub fn record_digest(record: &PreferenceRecord) -> Result<String> {
    let value = serde_json::to_value(record)?;
    Ok(value_digest(&value))
}

/// Hex digest of an arbitrary JSON value's structure
pub fn value_digest(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hash_value(&mut hasher, value);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn hash_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => hasher.update(b"z"),
        Value::Bool(b) => {
            hasher.update(b"b");
            hasher.update([*b as u8]);
        }
        Value::Number(n) => {
            hasher.update(b"n");
            hasher.update(n.to_string().as_bytes());
        }
        Value::String(s) => {
            hasher.update(b"s");
            hasher.update((s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }
        Value::Array(items) => {
            hasher.update(b"a");
            hasher.update((items.len() as u64).to_le_bytes());
            for item in items {
                hash_value(hasher, item);
            }
        }
        Value::Object(map) => {
            hasher.update(b"o");
            hasher.update((map.len() as u64).to_le_bytes());
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                hasher.update(b"k");
                hasher.update((key.len() as u64).to_le_bytes());
                hasher.update(key.as_bytes());
                hash_value(hasher, &map[key]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_matter() {
        let a: PreferenceRecord = serde_json::from_str(
            r#"{"timestamp": "2025-01-01T10:15:00Z", "userId": "u1", "partition": "p1"}"#,
        )
        .unwrap();
        let b: PreferenceRecord = serde_json::from_str(
            r#"{"partition": "p1", "userId": "u1", "timestamp": "2025-01-01T10:15:00Z"}"#,
        )
        .unwrap();

        assert_eq!(record_digest(&a).unwrap(), record_digest(&b).unwrap());
    }

    #[test]
    fn test_different_content_different_digest() {
        let a: PreferenceRecord =
            serde_json::from_str(r#"{"timestamp": "2025-01-01T10:15:00Z", "userId": "u1"}"#)
                .unwrap();
        let b: PreferenceRecord =
            serde_json::from_str(r#"{"timestamp": "2025-01-01T10:15:00Z", "userId": "u2"}"#)
                .unwrap();

        assert_ne!(record_digest(&a).unwrap(), record_digest(&b).unwrap());
    }

    #[test]
    fn test_type_tagging_distinguishes_shapes() {
        // "1" the string vs 1 the number vs [1] the array
        assert_ne!(value_digest(&json!("1")), value_digest(&json!(1)));
        assert_ne!(value_digest(&json!(1)), value_digest(&json!([1])));
        assert_ne!(value_digest(&json!(null)), value_digest(&json!("")));
        // Nested arrays can't collapse into one flat array
        assert_ne!(
            value_digest(&json!([["a"], ["b"]])),
            value_digest(&json!(["a", "b"]))
        );
    }

    #[test]
    fn test_digest_is_hex_and_stable() {
        let digest = value_digest(&json!({"a": 1, "b": [true, null]}));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, value_digest(&json!({"b": [true, null], "a": 1})));
    }

    #[test]
    fn test_unknown_fields_participate_in_identity() {
        let a: PreferenceRecord = serde_json::from_str(
            r#"{"timestamp": "2025-01-01T10:15:00Z", "purposes": [{"purpose": "Ads", "enabled": true}]}"#,
        )
        .unwrap();
        let b: PreferenceRecord = serde_json::from_str(
            r#"{"timestamp": "2025-01-01T10:15:00Z", "purposes": [{"purpose": "Ads", "enabled": false}]}"#,
        )
        .unwrap();

        assert_ne!(record_digest(&a).unwrap(), record_digest(&b).unwrap());
    }
}
