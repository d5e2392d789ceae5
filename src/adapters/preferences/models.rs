//! Wire types for the preference query endpoint
//!
//! The service exposes a single cursor-paginated query:
//! `POST {base_url}/v1/preferences/{partition}/query` with body
//! `{ "limit": 1..50, "filter"?: ..., "cursor"?: ... }` answering
//! `{ "nodes": [...], "cursor"?: ... }`.

use crate::domain::{PreferenceFilter, PreferenceRecord};
use serde::{Deserialize, Serialize};

/// Largest page the service will return
pub const MAX_PAGE_SIZE: u32 = 50;

/// Request body for a preference query
///
/// An empty filter is omitted entirely rather than sent as `{}`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    /// Records per page, 1..=50
    pub limit: u32,

    /// Record filter; `None` when the caller supplied nothing meaningful
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<PreferenceFilter>,

    /// Opaque continuation token from the previous page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl QueryRequest {
    /// Build a request, normalizing an empty filter to an absent one
    /// and clamping the limit to the service maximum.
    pub fn new(limit: u32, filter: Option<PreferenceFilter>, cursor: Option<String>) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            filter: filter.filter(|f| !f.is_empty()),
            cursor,
        }
    }
}

/// One page of query results
#[derive(Debug, Clone, Deserialize)]
pub struct QueryPage {
    /// Records in this page; empty means this window is exhausted
    #[serde(default)]
    pub nodes: Vec<PreferenceRecord>,

    /// Continuation token; absent means this window is exhausted
    #[serde(default)]
    pub cursor: Option<String>,
}

impl QueryPage {
    /// Whether pagination should stop after this page
    ///
    /// An empty `nodes` array ends the window even if the service
    /// happened to include a cursor.
    pub fn is_last(&self) -> bool {
        self.nodes.is_empty() || self.cursor.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identifier, SystemFilter};

    #[test]
    fn test_empty_filter_omitted_from_body() {
        let request = QueryRequest::new(10, Some(PreferenceFilter::default()), None);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("filter").is_none());
        assert!(json.get("cursor").is_none());
        assert_eq!(json["limit"], 10);
    }

    #[test]
    fn test_filter_with_only_empty_system_omitted() {
        let filter = PreferenceFilter {
            system: Some(SystemFilter::default()),
            ..Default::default()
        };
        let request = QueryRequest::new(10, Some(filter), None);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("filter").is_none());
    }

    #[test]
    fn test_populated_filter_serialized() {
        let filter = PreferenceFilter {
            identifiers: vec![Identifier::new("email", "a@example.com")],
            ..Default::default()
        };
        let request = QueryRequest::new(10, Some(filter), Some("abc".to_string()));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["filter"]["identifiers"][0]["name"], "email");
        assert_eq!(json["cursor"], "abc");
    }

    #[test]
    fn test_limit_clamped_to_service_maximum() {
        assert_eq!(QueryRequest::new(500, None, None).limit, MAX_PAGE_SIZE);
        assert_eq!(QueryRequest::new(0, None, None).limit, 1);
    }

    #[test]
    fn test_page_is_last() {
        let page: QueryPage = serde_json::from_str(r#"{"nodes": []}"#).unwrap();
        assert!(page.is_last());

        let page: QueryPage =
            serde_json::from_str(r#"{"nodes": [], "cursor": "tok"}"#).unwrap();
        assert!(page.is_last());

        let page: QueryPage = serde_json::from_str(
            r#"{"nodes": [{"timestamp": "2025-01-01T00:00:00Z"}], "cursor": "tok"}"#,
        )
        .unwrap();
        assert!(!page.is_last());

        let page: QueryPage =
            serde_json::from_str(r#"{"nodes": [{"timestamp": "2025-01-01T00:00:00Z"}]}"#)
                .unwrap();
        assert!(page.is_last());
    }
}
