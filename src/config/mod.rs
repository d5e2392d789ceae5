//! Configuration management for Harvest.
//!
//! TOML-based configuration loading, parsing, and validation with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `HARVEST_*` environment overrides
//! - Default values for every tuning knob
//! - Type-safe configuration structs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use harvest::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("harvest.toml")?;
//! println!("Preference service: {}", config.api.base_url);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApiConfig, DiscoveryConfig, ExportConfig, HarvestConfig, LoggingConfig, RetryConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};

impl HarvestConfig {
    /// Load configuration from a TOML file
    ///
    /// Convenience wrapper around [`load_config`].
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::domain::Result<Self> {
        load_config(path)
    }
}
