//! Request size admission.
//!
//! Rejects on the declared `Content-Length` before the body is read. A body
//! streamed without a declared length is not bounded here; that is a known
//! limitation of a header-only check.

use crate::config::GuardConfig;
use crate::error::GuardError;

/// Admit or reject a request given its path and declared length.
pub fn admit(config: &GuardConfig, path: &str, declared: Option<u64>) -> Result<(), GuardError> {
    if config.is_exempt(path) {
        return Ok(());
    }
    check_content_length(declared, config.max_body_bytes)
}

/// Reject when the declared length exceeds `limit`. Absent length passes.
pub fn check_content_length(declared: Option<u64>, limit: u64) -> Result<(), GuardError> {
    match declared {
        Some(declared) if declared > limit => Err(GuardError::PayloadTooLarge { declared, limit }),
        _ => Ok(()),
    }
}
