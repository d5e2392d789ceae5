//! Consent preference record model
//!
//! A record is a time-stamped per-user consent snapshot as returned by
//! the remote query service. Records are immutable once retrieved; the
//! service offers no stable per-record primary key, so identity for
//! dedup purposes is the structural content hash in [`crate::core::hash`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A name/value identifier attached to a record or used in a filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    /// Identifier name (e.g. "email", "coreIdentifier")
    pub name: String,

    /// Identifier value
    pub value: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Server-side bookkeeping attached to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetadata {
    /// When the service last updated this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Fields this crate doesn't interpret but must preserve for hashing
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A retrieved consent preference snapshot
///
/// The primary instant is `timestamp`; `system.updated_at` is the
/// optional secondary instant. Unknown fields are retained in `extra`
/// so the structural hash covers the full payload as transmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceRecord {
    /// Instant the consent snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Data partition this record belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,

    /// User the snapshot belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Identifiers attached to the record
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<Identifier>,

    /// Server-side metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemMetadata>,

    /// Unrecognized fields, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PreferenceRecord {
    /// The secondary instant, if the service reported one
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.system.as_ref().and_then(|s| s.updated_at)
    }

    /// Value of the first identifier, used as the final sort tie-break
    pub fn first_identifier_value(&self) -> &str {
        self.identifiers.first().map(|i| i.value.as_str()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserializes_wire_shape() {
        let json = r#"{
            "timestamp": "2025-01-01T10:15:00Z",
            "partition": "acme-prod",
            "userId": "user-42",
            "identifiers": [{"name": "email", "value": "a@example.com"}],
            "system": {"updatedAt": "2025-01-02T00:00:00Z", "decryptionStatus": "DECRYPTED"}
        }"#;

        let record: PreferenceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.user_id.as_deref(), Some("user-42"));
        assert_eq!(record.first_identifier_value(), "a@example.com");
        assert!(record.updated_at().is_some());
        // Unknown system fields survive the round trip
        assert!(record.system.unwrap().extra.contains_key("decryptionStatus"));
    }

    #[test]
    fn test_record_minimal_shape() {
        let json = r#"{"timestamp": "2025-01-01T10:15:00Z"}"#;
        let record: PreferenceRecord = serde_json::from_str(json).unwrap();
        assert!(record.user_id.is_none());
        assert!(record.identifiers.is_empty());
        assert!(record.updated_at().is_none());
        assert_eq!(record.first_identifier_value(), "");
    }

    #[test]
    fn test_unknown_top_level_fields_preserved() {
        let json = r#"{"timestamp": "2025-01-01T10:15:00Z", "purposes": [{"purpose": "Marketing", "enabled": true}]}"#;
        let record: PreferenceRecord = serde_json::from_str(json).unwrap();
        assert!(record.extra.contains_key("purposes"));

        let out = serde_json::to_value(&record).unwrap();
        assert!(out.get("purposes").is_some());
    }
}
