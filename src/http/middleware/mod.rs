//! Axum middleware.

pub mod hardening;

pub use hardening::{harden, Guard};
