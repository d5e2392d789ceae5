//! Cursor-following pagination for one window
//!
//! A [`WindowPages`] issues one logical query against one time window
//! and yields pages lazily, one remote round-trip at a time. The
//! sequence is finite and non-restartable: once a page comes back with
//! no records or no continuation cursor, the window is exhausted and
//! every later call returns `None`. Every round-trip goes through the
//! retry policy; a response that fails to decode is fatal, not retried.

use crate::adapters::preferences::{PreferenceStore, QueryRequest};
use crate::core::retry::RetryPolicy;
use crate::domain::{PreferenceFilter, PreferenceRecord, Result};
use std::sync::Arc;

/// Lazy, finite, non-restartable sequence of pages for one window
pub struct WindowPages {
    store: Arc<dyn PreferenceStore>,
    retry: RetryPolicy,
    partition: String,
    filter: Option<PreferenceFilter>,
    limit: u32,
    cursor: Option<String>,
    exhausted: bool,
}

impl WindowPages {
    /// Start a page sequence for one window-scoped filter
    ///
    /// `limit` is clamped to the service's page maximum by the request
    /// builder.
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        retry: RetryPolicy,
        partition: impl Into<String>,
        filter: Option<PreferenceFilter>,
        limit: u32,
    ) -> Self {
        Self {
            store,
            retry,
            partition: partition.into(),
            filter,
            limit,
            cursor: None,
            exhausted: false,
        }
    }

    /// Fetch the next page, or `None` once the window is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<PreferenceRecord>>> {
        if self.exhausted {
            return Ok(None);
        }

        let request = QueryRequest::new(self.limit, self.filter.clone(), self.cursor.take());
        let page = self
            .retry
            .execute("preference query", || {
                self.store.query(&self.partition, &request)
            })
            .await?;

        self.exhausted = page.is_last();
        self.cursor = page.cursor;

        if page.nodes.is_empty() {
            Ok(None)
        } else {
            Ok(Some(page.nodes))
        }
    }
}
