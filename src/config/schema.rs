//! Configuration schema types
//!
//! This module defines the configuration structure for Harvest. Every
//! knob the retrieval engine exposes lives here with its default,
//! so a minimal TOML file only needs the API section.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};

/// Main Harvest configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Preference service connection settings
    pub api: ApiConfig,

    /// Retrieval tuning
    #[serde(default)]
    pub export: ExportConfig,

    /// Boundary discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HarvestConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error message if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.api.validate()?;
        self.export.validate()?;
        self.discovery.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Preference service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the preference service
    pub base_url: String,

    /// Bearer token for authentication (optional for local stacks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<SecretString>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Whether to verify TLS certificates
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Retry behavior for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ApiConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("api.base_url must not be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!(
                "api.base_url must start with http:// or https://, got '{}'",
                self.base_url
            ));
        }
        if self.timeout_seconds == 0 {
            return Err("api.timeout_seconds must be greater than 0".to_string());
        }
        self.retry.validate()
    }
}

/// Retry behavior for transient failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Base backoff delay in milliseconds; attempt n waits
    /// `base_delay_ms * 2^(n-1)` plus jitter in `[0, base_delay_ms)`
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("api.retry.max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Retrieval tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Records per page; the service caps pages at 50
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// How many windows are fetched concurrently
    #[serde(default = "default_window_concurrency")]
    pub window_concurrency: usize,

    /// Maximum number of windows the span is split into
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,

    /// When true, a window whose fetch fails after retries is skipped
    /// and recorded on the summary instead of aborting the retrieval
    #[serde(default)]
    pub continue_on_window_error: bool,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("export.page_size must be at least 1".to_string());
        }
        if self.window_concurrency == 0 {
            return Err("export.window_concurrency must be at least 1".to_string());
        }
        if self.max_chunks == 0 {
            return Err("export.max_chunks must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            window_concurrency: default_window_concurrency(),
            max_chunks: default_max_chunks(),
            continue_on_window_error: false,
        }
    }
}

/// Boundary discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Safety cap on how far back the earliest-data search may probe
    #[serde(default = "default_max_lookback_days")]
    pub max_lookback_days: i64,
}

impl DiscoveryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_lookback_days < 1 {
            return Err("discovery.max_lookback_days must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_lookback_days: default_max_lookback_days(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to also write logs to rotating local files
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for local log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Emit JSON-formatted log lines instead of human-readable ones
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(format!(
                "logging.log_level must be one of trace/debug/info/warn/error, got '{other}'"
            )),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            local_enabled: false,
            local_path: default_log_path(),
            json: false,
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_page_size() -> u32 {
    50
}

fn default_window_concurrency() -> usize {
    10
}

fn default_max_chunks() -> usize {
    100
}

fn default_max_lookback_days() -> i64 {
    3650
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_path() -> String {
    "./logs".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> HarvestConfig {
        toml::from_str(
            r#"
            [api]
            base_url = "https://consent.example.com"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = minimal_config();
        assert_eq!(config.api.timeout_seconds, 30);
        assert!(config.api.tls_verify);
        assert_eq!(config.api.retry.max_attempts, 3);
        assert_eq!(config.api.retry.base_delay_ms, 200);
        assert_eq!(config.export.page_size, 50);
        assert_eq!(config.export.window_concurrency, 10);
        assert_eq!(config.export.max_chunks, 100);
        assert!(!config.export.continue_on_window_error);
        assert_eq!(config.discovery.max_lookback_days, 3650);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = minimal_config();
        config.api.base_url = "consent.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_knobs() {
        let mut config = minimal_config();
        config.export.window_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = minimal_config();
        config.export.max_chunks = 0;
        assert!(config.validate().is_err());

        let mut config = minimal_config();
        config.api.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut config = minimal_config();
        config.logging.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }
}
