//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! hardening middleware produces:
//!     → metrics.rs (counter, latency histogram, in-flight gauge)
//!     → logging.rs (structured events inside a per-request span)
//!
//! Consumers:
//!     → /metrics scrape (Prometheus text format)
//!     → stdout (plain or JSON lines)
//! ```
//!
//! # Design Decisions
//! - Both backends are optional; request handling never depends on them
//! - Request ID flows through every log line via the request span

pub mod logging;
pub mod metrics;

#[cfg(feature = "json-logs")]
pub use logging::json_layer;
pub use logging::{init_logging, install_panic_hook, LogFormat, LoggingError};
pub use metrics::{default_sink, InFlightGuard, MetricsSink, NoopMetrics};
