//! Retry policy for remote calls
//!
//! Wraps a single remote operation with bounded exponential backoff.
//! Only errors whose message matches the transient signature table are
//! retried; decode errors are never retried regardless of message. The
//! signature table is a constant passed into the policy, not a hidden
//! global, so tests and unusual deployments can substitute their own.

use crate::config::RetryConfig;
use crate::domain::{HarvestError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Error message fragments treated as transient, matched
/// case-insensitively against the error's display text.
pub const TRANSIENT_ERROR_SIGNATURES: &[&str] = &[
    "econnreset",
    "econnrefused",
    "etimedout",
    "epipe",
    "socket hang up",
    "timeout",
    "timed out",
    "connection reset",
    "connection closed",
    "network error",
    "bad gateway",
    "service unavailable",
    "gateway timeout",
    "too many requests",
    "rate limit",
    "unknown request error",
];

/// Bounded exponential backoff with transient-error classification
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay_ms: u64,
    signatures: &'static [&'static str],
}

impl RetryPolicy {
    /// Build a policy from configuration with the default signature table
    pub fn new(config: &RetryConfig) -> Self {
        Self::with_signatures(config, TRANSIENT_ERROR_SIGNATURES)
    }

    /// Build a policy with an explicit signature table
    pub fn with_signatures(config: &RetryConfig, signatures: &'static [&'static str]) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            signatures,
        }
    }

    /// Whether an error qualifies for another attempt
    pub fn is_transient(&self, error: &HarvestError) -> bool {
        if error.is_decode_error() {
            return false;
        }
        let message = error.to_string().to_lowercase();
        self.signatures.iter().any(|s| message.contains(s))
    }

    /// Execute an operation with up to `max_attempts` tries
    ///
    /// Attempt `n` sleeps `base_delay_ms * 2^(n-1)` plus random jitter
    /// in `[0, base_delay_ms)` before retrying. Both a non-transient
    /// error and attempt exhaustion surface as
    /// [`HarvestError::RetriesExhausted`], carrying the attempt count
    /// and the last underlying message; callers must treat that as an
    /// operation failure, never as "no data".
    pub async fn execute<T, F, Fut>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !self.is_transient(&e) || attempt >= self.max_attempts {
                        if attempt > 1 || self.is_transient(&e) {
                            tracing::warn!(
                                operation = operation_name,
                                attempts = attempt,
                                error = %e,
                                "Giving up after failed attempts"
                            );
                        }
                        return Err(HarvestError::RetriesExhausted {
                            attempts: attempt,
                            last_error: e.to_string(),
                        });
                    }

                    let backoff = self
                        .base_delay_ms
                        .saturating_mul(1u64 << (attempt - 1).min(32));
                    let jitter = if self.base_delay_ms > 0 {
                        rand::thread_rng().gen_range(0..self.base_delay_ms)
                    } else {
                        0
                    };
                    let delay = Duration::from_millis(backoff.saturating_add(jitter));

                    tracing::warn!(
                        operation = operation_name,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after transient error"
                    );

                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
