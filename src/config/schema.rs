//! Configuration schema definitions.
//!
//! All fields have defaults so an empty TOML file (or no file at all) yields
//! a working configuration. Environment overrides are applied in `loader.rs`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default timeout budget for a downstream handler, in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Largest accepted timeout budget (one day), in seconds.
pub const MAX_TIMEOUT_SECS: f64 = 86_400.0;

/// Default maximum declared request body size (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// Root configuration for a hardened service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GuardConfig {
    /// Service name, used as the `service` metric label.
    pub service_name: String,

    /// Budget for a single handler invocation, in seconds.
    pub request_timeout_secs: f64,

    /// Largest accepted `Content-Length`, in bytes.
    pub max_body_bytes: u64,

    /// Emit one JSON object per log line instead of plain text.
    pub json_logging: bool,

    /// Log filter directive (e.g. "info", "request_hardening=debug").
    pub log_level: String,

    /// Liveness route. Exempt from body-size admission.
    pub health_path: String,

    /// Metrics scrape route. Exempt from body-size admission.
    pub metrics_path: String,

    /// Bind address for the bundled server.
    pub bind_address: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            service_name: "inference-service".to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            json_logging: false,
            log_level: "info".to_string(),
            health_path: "/health".to_string(),
            metrics_path: "/metrics".to_string(),
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

impl GuardConfig {
    /// Timeout budget as a `Duration`. Out-of-range values (rejected by
    /// validation) fall back to the default budget.
    pub fn timeout(&self) -> Duration {
        match Duration::try_from_secs_f64(self.request_timeout_secs) {
            Ok(budget) if !budget.is_zero() && self.request_timeout_secs <= MAX_TIMEOUT_SECS => budget,
            _ => Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Whether `path` is exempt from body-size admission.
    pub fn is_exempt(&self, path: &str) -> bool {
        path == self.health_path || path == self.metrics_path
    }
}
