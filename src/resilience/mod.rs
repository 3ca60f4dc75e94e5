//! Resilience subsystem.
//!
//! # Design Decisions
//! - Handler invocations are bounded by a wall-clock budget
//! - Cancellation is cooperative; abandoned work is detached, never killed
//! - Retries are the caller's job

pub mod timeouts;

pub use timeouts::{supervise, Outcome};
