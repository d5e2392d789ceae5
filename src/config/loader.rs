//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::HarvestConfig;
use super::secret::secret_string;
use crate::domain::errors::HarvestError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into HarvestConfig
/// 4. Applies environment variable overrides (HARVEST_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, TOML parsing fails, a
/// referenced environment variable is missing, or validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<HarvestConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(HarvestError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        HarvestError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: HarvestConfig = toml::from_str(&contents)
        .map_err(|e| HarvestError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        HarvestError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line to skip comments
    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(HarvestError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the HARVEST_* prefix
///
/// Variables follow the pattern HARVEST_<SECTION>_<KEY>, for example
/// HARVEST_API_BASE_URL or HARVEST_EXPORT_PAGE_SIZE.
fn apply_env_overrides(config: &mut HarvestConfig) {
    if let Ok(val) = std::env::var("HARVEST_API_BASE_URL") {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("HARVEST_API_TOKEN") {
        config.api.api_token = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("HARVEST_API_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.api.timeout_seconds = secs;
        }
    }
    if let Ok(val) = std::env::var("HARVEST_API_TLS_VERIFY") {
        config.api.tls_verify = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("HARVEST_API_RETRY_MAX_ATTEMPTS") {
        if let Ok(attempts) = val.parse() {
            config.api.retry.max_attempts = attempts;
        }
    }
    if let Ok(val) = std::env::var("HARVEST_API_RETRY_BASE_DELAY_MS") {
        if let Ok(delay) = val.parse() {
            config.api.retry.base_delay_ms = delay;
        }
    }

    if let Ok(val) = std::env::var("HARVEST_EXPORT_PAGE_SIZE") {
        if let Ok(size) = val.parse() {
            config.export.page_size = size;
        }
    }
    if let Ok(val) = std::env::var("HARVEST_EXPORT_WINDOW_CONCURRENCY") {
        if let Ok(concurrency) = val.parse() {
            config.export.window_concurrency = concurrency;
        }
    }
    if let Ok(val) = std::env::var("HARVEST_EXPORT_MAX_CHUNKS") {
        if let Ok(chunks) = val.parse() {
            config.export.max_chunks = chunks;
        }
    }
    if let Ok(val) = std::env::var("HARVEST_EXPORT_CONTINUE_ON_WINDOW_ERROR") {
        config.export.continue_on_window_error = val.parse().unwrap_or(false);
    }

    if let Ok(val) = std::env::var("HARVEST_DISCOVERY_MAX_LOOKBACK_DAYS") {
        if let Ok(days) = val.parse() {
            config.discovery.max_lookback_days = days;
        }
    }

    if let Ok(val) = std::env::var("HARVEST_LOGGING_LOG_LEVEL") {
        config.logging.log_level = val;
    }
}
