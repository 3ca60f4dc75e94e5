//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (declared body size, exempt routes)
//!     → pass to the timeout supervisor
//! ```
//!
//! # Design Decisions
//! - Early rejection: no handler work for oversized payloads
//! - Authentication lives elsewhere

pub mod limits;
