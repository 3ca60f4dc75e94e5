//! Request-hardening middleware for HTTP inference services.
//!
//! One axum layer that every service mounts in front of its handlers:
//! body-size admission, a timeout budget, correlation ids, and request
//! metrics plus structured logs for every outcome.
//!
//! ```rust,ignore
//! use axum::{routing::post, Router};
//! use request_hardening::{config::GuardConfig, http::{build_router, Guard}};
//!
//! let guard = Guard::from_config(GuardConfig::default());
//! let app = build_router(Router::new().route("/v1/sentiment", post(score)), guard);
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::GuardConfig;
pub use error::GuardError;
pub use http::{build_router, Guard, HttpServer, RequestContext};
pub use lifecycle::Shutdown;
