//! Domain models and types for Harvest.
//!
//! This module contains the core domain models shared by every layer:
//! the error hierarchy, the crate-wide `Result` alias, the consent
//! preference record model, and the query filter with its chunk-mode
//! selection rules.

pub mod errors;
pub mod filter;
pub mod record;
pub mod result;

pub use errors::{HarvestError, PreferenceApiError};
pub use filter::{pick_chunk_mode, ChunkMode, PreferenceFilter, SystemFilter};
pub use record::{Identifier, PreferenceRecord, SystemMetadata};
pub use result::Result;
