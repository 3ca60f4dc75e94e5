//! Errors absorbed at the middleware boundary.
//!
//! Every variant maps to a fixed status and a fixed JSON body. The
//! `Display` text carries full detail for server logs only; it never
//! reaches the client.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::response::error_response;

pub const PAYLOAD_TOO_LARGE: &str = "Payload too large";
pub const REQUEST_TIMEOUT: &str = "Request timeout";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum GuardError {
    /// Declared body exceeds the configured maximum.
    #[error("declared body of {declared} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { declared: u64, limit: u64 },

    /// Handler did not finish within its budget.
    #[error("handler exceeded timeout budget of {budget:?}")]
    Timeout { budget: Duration },

    /// Handler failed without producing a response.
    #[error("unhandled handler failure: {0}")]
    Internal(String),
}

impl GuardError {
    pub fn status(&self) -> StatusCode {
        match self {
            GuardError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GuardError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GuardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Sanitized message sent to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            GuardError::PayloadTooLarge { .. } => PAYLOAD_TOO_LARGE,
            GuardError::Timeout { .. } => REQUEST_TIMEOUT,
            GuardError::Internal(_) => INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.public_message())
    }
}
