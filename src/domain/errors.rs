//! Domain error types
//!
//! This module defines the error hierarchy for Harvest. All errors are
//! domain-specific and don't expose third-party types; the HTTP adapter
//! maps transport failures into [`PreferenceApiError`] variants before
//! they cross this boundary.

use thiserror::Error;

/// Main Harvest error type
///
/// This is the primary error type used throughout the crate. It wraps
/// specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Preference service errors
    #[error("Preference API error: {0}")]
    Api(#[from] PreferenceApiError),

    /// An operation failed after exhausting its retry budget
    ///
    /// Carries the attempt count and the last underlying message so a
    /// caller can distinguish "gave up" from "no data".
    #[error("Operation failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },

    /// Boundary discovery errors
    #[error("Boundary discovery error: {0}")]
    Discovery(String),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Preference service-specific errors
///
/// Errors that occur when talking to the remote preference query
/// service. These don't expose the HTTP client's types.
#[derive(Debug, Error)]
pub enum PreferenceApiError {
    /// Failed to reach the preference service
    #[error("Failed to connect to preference service: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Query rejected or failed on the server
    #[error("Query failed with status {status}: {message}")]
    QueryFailed { status: u16, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Response did not match the expected shape
    ///
    /// Always fatal: retrying cannot fix a schema mismatch.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl HarvestError {
    /// Whether this error is a decode/schema failure that must never be
    /// retried regardless of what its message looks like.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            HarvestError::Api(PreferenceApiError::InvalidResponse(_))
                | HarvestError::Serialization(_)
        )
    }
}

impl From<std::io::Error> for HarvestError {
    fn from(err: std::io::Error) -> Self {
        HarvestError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for HarvestError {
    fn from(err: serde_json::Error) -> Self {
        HarvestError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for HarvestError {
    fn from(err: toml::de::Error) -> Self {
        HarvestError::Configuration(format!("TOML parse error: {err}"))
    }
}
