//! Configuration validation.
//!
//! Semantic checks only; serde handles syntax. All errors are collected
//! rather than stopping at the first.

use std::fmt;
use std::time::Duration;

use crate::config::schema::{GuardConfig, MAX_TIMEOUT_SECS};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service_name.trim().is_empty() {
        errors.push(ValidationError::new("service_name", "must not be empty"));
    }

    let timeout = config.request_timeout_secs;
    let representable = Duration::try_from_secs_f64(timeout).map(|d| !d.is_zero()).unwrap_or(false);
    if !representable || timeout > MAX_TIMEOUT_SECS {
        errors.push(ValidationError::new(
            "request_timeout_secs",
            format!("must be in (0, {}], got {}", MAX_TIMEOUT_SECS, timeout),
        ));
    }

    if config.max_body_bytes == 0 {
        errors.push(ValidationError::new("max_body_bytes", "must be greater than zero"));
    }

    for (field, path) in [("health_path", &config.health_path), ("metrics_path", &config.metrics_path)] {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, format!("must start with '/', got {:?}", path)));
        }
    }

    if config.health_path == config.metrics_path {
        errors.push(ValidationError::new("metrics_path", "must differ from health_path"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
