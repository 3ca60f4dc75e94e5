//! Structured logging.
//!
//! Installs the process-wide `tracing` subscriber once at startup. With
//! `json_logging` on, every line is one JSON object carrying `timestamp`,
//! `level`, the message fields and the current span (which holds the
//! request id while a request is being handled).

use thiserror::Error;
#[cfg(feature = "json-logs")]
use tracing::Subscriber;
#[cfg(feature = "json-logs")]
use tracing_subscriber::fmt::{
    self,
    format::{Format, Json, JsonFields},
    MakeWriter,
};
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "json-logs")]
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::GuardConfig;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {filter:?}: {reason}")]
    Filter { filter: String, reason: String },

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}

/// Output format actually installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

/// Resolve the format for `config`, falling back to plain text when the
/// JSON formatter is not compiled in.
pub fn resolve_format(config: &GuardConfig) -> LogFormat {
    if config.json_logging && cfg!(feature = "json-logs") {
        LogFormat::Json
    } else {
        LogFormat::Plain
    }
}

/// Build the filter: `RUST_LOG` when set, else the configured level.
pub fn build_filter(config: &GuardConfig) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| LoggingError::Filter {
            filter: config.log_level.clone(),
            reason: e.to_string(),
        }),
    }
}

/// One JSON object per event, with the innermost span (and its
/// `request_id`) under `span`.
#[cfg(feature = "json-logs")]
pub fn json_layer<S, W>(make_writer: W) -> fmt::Layer<S, JsonFields, Format<Json>, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(make_writer)
}

/// Report panics as `error` events so they share the log format and the
/// request span of the panicking handler. Call after `init_logging`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "Panic in task");
    }));
}

/// Install the global subscriber.
pub fn init_logging(config: &GuardConfig) -> Result<LogFormat, LoggingError> {
    let filter = build_filter(config)?;
    let format = resolve_format(config);

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        #[cfg(feature = "json-logs")]
        LogFormat::Json => registry.with(json_layer(std::io::stdout)).try_init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    installed.map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;

    if config.json_logging && format == LogFormat::Plain {
        tracing::warn!("JSON logging requested but not available in this build, using plain text");
    }

    Ok(format)
}
