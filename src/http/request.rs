//! Request-scoped state: correlation id and per-request context.
//!
//! # Responsibilities
//! - Adopt an inbound `X-Request-ID` or generate a UUID v4
//! - Carry method, route, declared size, timing and cancellation alongside
//!   the request (in its extensions) so handlers never need ambient state

use std::fmt;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use axum::response::Response;
use tokio::sync::watch;
use uuid::Uuid;

/// Correlation header, read from requests and written to every response.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation identifier for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(HeaderValue);

impl RequestId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        let id = Uuid::new_v4().to_string();
        // A hyphenated UUID is always a valid header value.
        Self(HeaderValue::from_str(&id).unwrap_or_else(|_| HeaderValue::from_static("invalid")))
    }

    /// Adopt the inbound header if it is present, printable and non-empty.
    pub fn from_headers_or_new(headers: &HeaderMap) -> Self {
        headers
            .get(&X_REQUEST_ID)
            .filter(|value| value.to_str().map(|s| !s.trim().is_empty()).unwrap_or(false))
            .map(|value| Self(value.clone()))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        // Only constructed from values that passed `to_str`.
        self.0.to_str().unwrap_or_default()
    }

    /// Set the correlation header on `response`, replacing any value the
    /// handler may have written.
    pub fn attach(&self, mut response: Response) -> Response {
        response.headers_mut().insert(X_REQUEST_ID, self.0.clone());
        response
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trips the cancellation signal of an abandoned request.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Cooperative cancellation observed by handlers.
///
/// The middleware never preempts a handler that outlives its budget. A
/// handler doing long work should check `is_cancelled` (or await
/// `cancelled`) and stop early once the caller has been answered.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the request has been abandoned. Never resolves for a
    /// request that finished in time.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn cancellation_pair() -> (CancelHandle, CancellationSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancellationSignal { rx })
}

/// Per-request context, inserted into the request extensions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub method: Method,
    /// Route template when matched, raw path otherwise.
    pub route: String,
    pub content_length: Option<u64>,
    pub started: Instant,
    pub deadline: Instant,
    pub cancellation: CancellationSignal,
}

impl RequestContext {
    /// Time left before the caller is answered with a timeout.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn cancellation(&self) -> &CancellationSignal {
        &self.cancellation
    }
}

/// Declared `Content-Length`, if present and parseable.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
