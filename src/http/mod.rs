//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, trace layer)
//!     → middleware/hardening.rs
//!         → security::limits (admission)
//!         → request.rs (request id, RequestContext)
//!         → resilience::timeouts (supervised handler)
//!         → observability::metrics (count, latency, in-flight)
//!     → response.rs (error bodies) / handler response + x-request-id
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::{harden, Guard};
pub use request::{CancellationSignal, RequestContext, RequestId, X_REQUEST_ID};
pub use server::{build_router, HttpServer};
