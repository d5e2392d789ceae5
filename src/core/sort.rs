//! Final deterministic ordering of the merged record sequence
//!
//! The comparator is a total order independent of arrival or chunk
//! order: newest first on the active dimension, then newest first on
//! the other dimension, then user id and first identifier value
//! ascending. Records missing an instant sort after records that have
//! one on the descending keys.

use crate::domain::{ChunkMode, PreferenceRecord};
use std::cmp::Ordering;

/// Compare two records under the final output ordering
pub fn compare_records(a: &PreferenceRecord, b: &PreferenceRecord, mode: ChunkMode) -> Ordering {
    // Option<DateTime> ordering puts None first, so comparing b to a
    // yields descending instants with absent ones last.
    mode.instant_of(b)
        .cmp(&mode.instant_of(a))
        .then_with(|| {
            mode.other_instant_of(b)
                .cmp(&mode.other_instant_of(a))
        })
        .then_with(|| {
            a.user_id
                .as_deref()
                .unwrap_or("")
                .cmp(b.user_id.as_deref().unwrap_or(""))
        })
        .then_with(|| a.first_identifier_value().cmp(b.first_identifier_value()))
}

/// Sort records in place under the final output ordering (stable)
pub fn sort_records(records: &mut [PreferenceRecord], mode: ChunkMode) {
    records.sort_by(|a, b| compare_records(a, b, mode));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(timestamp: &str, updated: Option<&str>, user: &str, ident: Option<&str>) -> PreferenceRecord {
        let mut value = json!({
            "timestamp": timestamp,
            "userId": user,
        });
        if let Some(updated) = updated {
            value["system"] = json!({ "updatedAt": updated });
        }
        if let Some(ident) = ident {
            value["identifiers"] = json!([{ "name": "email", "value": ident }]);
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_primary_key_newest_first() {
        let mut records = vec![
            record("2025-01-01T10:00:00Z", None, "u1", None),
            record("2025-01-03T10:00:00Z", None, "u2", None),
            record("2025-01-02T10:00:00Z", None, "u3", None),
        ];
        sort_records(&mut records, ChunkMode::Timestamp);

        let users: Vec<_> = records.iter().map(|r| r.user_id.clone().unwrap()).collect();
        assert_eq!(users, vec!["u2", "u3", "u1"]);
    }

    #[test]
    fn test_tie_breaks_in_order() {
        let t = "2025-01-01T10:00:00Z";
        let mut records = vec![
            record(t, Some("2025-01-02T00:00:00Z"), "bob", Some("x")),
            record(t, Some("2025-01-05T00:00:00Z"), "zed", Some("y")),
            record(t, Some("2025-01-02T00:00:00Z"), "alice", Some("b")),
            record(t, Some("2025-01-02T00:00:00Z"), "alice", Some("a")),
        ];
        sort_records(&mut records, ChunkMode::Timestamp);

        // Other-dimension descending first, then user asc, then identifier asc
        let keys: Vec<_> = records
            .iter()
            .map(|r| {
                (
                    r.user_id.clone().unwrap(),
                    r.first_identifier_value().to_string(),
                )
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                ("zed".to_string(), "y".to_string()),
                ("alice".to_string(), "a".to_string()),
                ("alice".to_string(), "b".to_string()),
                ("bob".to_string(), "x".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_secondary_instant_sorts_last() {
        let t = "2025-01-01T10:00:00Z";
        let mut records = vec![
            record(t, None, "no-updated", None),
            record(t, Some("2025-01-02T00:00:00Z"), "has-updated", None),
        ];
        sort_records(&mut records, ChunkMode::Timestamp);
        assert_eq!(records[0].user_id.as_deref(), Some("has-updated"));
    }

    #[test]
    fn test_updated_mode_swaps_dimensions() {
        let mut records = vec![
            record("2025-01-09T00:00:00Z", Some("2025-01-01T00:00:00Z"), "old-update", None),
            record("2025-01-01T00:00:00Z", Some("2025-01-09T00:00:00Z"), "new-update", None),
        ];
        sort_records(&mut records, ChunkMode::Updated);
        assert_eq!(records[0].user_id.as_deref(), Some("new-update"));
    }

    #[test]
    fn test_order_independent_of_input_permutation() {
        let mut a = vec![
            record("2025-01-02T00:00:00Z", None, "u1", None),
            record("2025-01-01T00:00:00Z", None, "u2", None),
            record("2025-01-03T00:00:00Z", None, "u3", None),
        ];
        let mut b: Vec<_> = a.iter().rev().cloned().collect();

        sort_records(&mut a, ChunkMode::Timestamp);
        sort_records(&mut b, ChunkMode::Timestamp);
        assert_eq!(a, b);
    }
}
