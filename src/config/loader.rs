//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GuardConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

pub const ENV_SERVICE_NAME: &str = "SERVICE_NAME";
pub const ENV_TIMEOUT: &str = "REQUEST_TIMEOUT_SECONDS";
pub const ENV_MAX_BODY: &str = "MAX_REQUEST_SIZE_BYTES";
pub const ENV_JSON_LOGGING: &str = "JSON_LOGGING";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_BIND_ADDRESS: &str = "BIND_ADDRESS";

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GuardConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GuardConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the process configuration: optional TOML file, then environment
/// overrides, then validation. Called once at startup.
pub fn load_from_env(path: Option<&Path>) -> Result<GuardConfig, ConfigError> {
    let base = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => GuardConfig::default(),
    };

    let config = apply_env_overrides(base, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(?config, "Configuration resolved");
    Ok(config)
}

/// Overlay environment values onto `config`. `lookup` abstracts the
/// environment so callers can supply their own source.
pub fn apply_env_overrides<F>(mut config: GuardConfig, lookup: F) -> Result<GuardConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = lookup(ENV_SERVICE_NAME) {
        config.service_name = name;
    }
    if let Some(raw) = lookup(ENV_TIMEOUT) {
        config.request_timeout_secs = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { var: ENV_TIMEOUT, value: raw })?;
    }
    if let Some(raw) = lookup(ENV_MAX_BODY) {
        config.max_body_bytes = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { var: ENV_MAX_BODY, value: raw })?;
    }
    if let Some(raw) = lookup(ENV_JSON_LOGGING) {
        config.json_logging = parse_flag(&raw).ok_or(ConfigError::Env { var: ENV_JSON_LOGGING, value: raw })?;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.log_level = level;
    }
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.bind_address = addr;
    }
    Ok(config)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
