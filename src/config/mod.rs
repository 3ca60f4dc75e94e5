//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (GUARD_CONFIG)
//!     → loader.rs (parse, overlay environment variables)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → shared via Arc with the middleware
//! ```
//!
//! # Design Decisions
//! - Read once at startup; never mutated afterwards
//! - All fields have defaults to allow minimal configs
//! - Environment wins over the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::GuardConfig;
