//! Query filter model and chunk-mode selection
//!
//! A filter carries an identifier list plus at most one *chunk
//! dimension*: either the `[timestampAfter, timestampBefore)` pair or
//! the `[updatedAfter, updatedBefore)` pair nested under `system`. The
//! retrieval engine never populates both dimensions in a single
//! outgoing request; [`PreferenceFilter::scoped_to_window`] enforces
//! that by stripping the inactive dimension.

use super::record::{Identifier, PreferenceRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The time dimension driving chunk boundaries for one retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkMode {
    /// Chunk on the record's primary `timestamp`
    Timestamp,
    /// Chunk on the service-side `system.updatedAt`
    Updated,
}

impl ChunkMode {
    /// The record instant on this dimension
    pub fn instant_of(&self, record: &PreferenceRecord) -> Option<DateTime<Utc>> {
        match self {
            ChunkMode::Timestamp => Some(record.timestamp),
            ChunkMode::Updated => record.updated_at(),
        }
    }

    /// The record instant on the *other* dimension (sort tie-break)
    pub fn other_instant_of(&self, record: &PreferenceRecord) -> Option<DateTime<Utc>> {
        match self {
            ChunkMode::Timestamp => record.updated_at(),
            ChunkMode::Updated => Some(record.timestamp),
        }
    }
}

impl std::fmt::Display for ChunkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkMode::Timestamp => write!(f, "timestamp"),
            ChunkMode::Updated => write!(f, "updated"),
        }
    }
}

/// Pick the chunk dimension implied by a caller-supplied filter
///
/// Pure function of the input: if either timestamp bound is set the
/// mode is [`ChunkMode::Timestamp`], otherwise [`ChunkMode::Updated`].
/// Computed once per retrieval and held constant throughout.
pub fn pick_chunk_mode(filter: Option<&PreferenceFilter>) -> ChunkMode {
    match filter {
        Some(f) if f.timestamp_after.is_some() || f.timestamp_before.is_some() => {
            ChunkMode::Timestamp
        }
        _ => ChunkMode::Updated,
    }
}

/// Bounds on the service-side update instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_after: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_before: Option<DateTime<Utc>>,
}

impl SystemFilter {
    pub fn is_empty(&self) -> bool {
        self.updated_after.is_none() && self.updated_before.is_none()
    }
}

/// Filter sent with a preference query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceFilter {
    /// Restrict to records carrying these identifiers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<Identifier>,

    /// Inclusive lower bound on the primary instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_after: Option<DateTime<Utc>>,

    /// Upper bound on the primary instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_before: Option<DateTime<Utc>>,

    /// Bounds on the secondary (update) instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemFilter>,
}

impl PreferenceFilter {
    /// Whether this filter would serialize to nothing meaningful
    ///
    /// An empty filter (including one holding only an empty `system`
    /// sub-object) must be omitted from the request body entirely
    /// rather than sent as `{}`.
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
            && self.timestamp_after.is_none()
            && self.timestamp_before.is_none()
            && self.system.as_ref().map_or(true, SystemFilter::is_empty)
    }

    /// The caller's bound pair on the given dimension
    pub fn bounds(&self, mode: ChunkMode) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match mode {
            ChunkMode::Timestamp => (self.timestamp_after, self.timestamp_before),
            ChunkMode::Updated => {
                let system = self.system.as_ref();
                (
                    system.and_then(|s| s.updated_after),
                    system.and_then(|s| s.updated_before),
                )
            }
        }
    }

    /// Restrict this filter to one window on the active dimension
    ///
    /// Sets the given bounds on the active dimension and strips the
    /// inactive dimension's bounds so the two can never travel in one
    /// request. Identifiers are preserved.
    pub fn scoped_to_window(
        &self,
        mode: ChunkMode,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Self {
        let mut scoped = Self {
            identifiers: self.identifiers.clone(),
            ..Default::default()
        };
        match mode {
            ChunkMode::Timestamp => {
                scoped.timestamp_after = after;
                scoped.timestamp_before = before;
            }
            ChunkMode::Updated => {
                if after.is_some() || before.is_some() {
                    scoped.system = Some(SystemFilter {
                        updated_after: after,
                        updated_before: before,
                    });
                }
            }
        }
        scoped
    }
}
