//! Result type alias used throughout the crate

use super::errors::HarvestError;

/// Crate-wide result type
pub type Result<T, E = HarvestError> = std::result::Result<T, E>;
