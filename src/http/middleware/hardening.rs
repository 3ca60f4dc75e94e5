//! Request-hardening middleware.
//!
//! Per request, in order: admission gate, correlation id, supervised
//! handler invocation, then finalization (metrics, header, completion log).
//! Every path ends in a response that carries `x-request-id` and is counted
//! exactly once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::http::request::{cancellation_pair, declared_length, RequestContext, RequestId};
use crate::observability::metrics::{default_sink, InFlightGuard, MetricsSink};
use crate::resilience::timeouts::{supervise, Outcome};
use crate::security::limits;

/// Shared middleware state: immutable config plus the injected metrics sink.
#[derive(Clone)]
pub struct Guard {
    config: Arc<GuardConfig>,
    metrics: Arc<dyn MetricsSink>,
}

impl Guard {
    pub fn new(config: GuardConfig, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { config: Arc::new(config), metrics }
    }

    /// Guard with the best metrics backend this build offers.
    pub fn from_config(config: GuardConfig) -> Self {
        Self::new(config, default_sink())
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn metrics(&self) -> &dyn MetricsSink {
        self.metrics.as_ref()
    }
}

/// Route label: the matched template when routing succeeded, else the raw path.
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

/// Middleware entry point, mounted with `axum::middleware::from_fn_with_state`.
pub async fn harden(State(guard): State<Guard>, mut request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let config = guard.config();
    let service = config.service_name.as_str();
    let _in_flight = InFlightGuard::new(guard.metrics(), service);

    let method = request.method().clone();
    let route = route_label(&request);
    let declared = declared_length(request.headers());

    let admission = limits::admit(config, request.uri().path(), declared);
    let request_id = RequestId::from_headers_or_new(request.headers());
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %route,
    );

    let response = async {
        if let Err(err) = admission {
            tracing::warn!(error = %err, "Rejected oversized request");
            return err.into_response();
        }

        let budget = config.timeout();
        let (cancel, cancellation) = cancellation_pair();
        request.extensions_mut().insert(RequestContext {
            request_id: request_id.clone(),
            method: method.clone(),
            route: route.clone(),
            content_length: declared,
            started,
            deadline: started + budget,
            cancellation,
        });

        let handler = next.run(request).instrument(tracing::Span::current());
        match supervise(handler, budget).await {
            Outcome::Completed(response) => response,
            Outcome::TimedOut => {
                cancel.cancel();
                let err = GuardError::Timeout { budget };
                tracing::error!(method = %method, path = %route, error = %err, "Request timed out");
                err.into_response()
            }
            Outcome::Panicked(detail) => {
                let err = GuardError::Internal(detail);
                tracing::error!(method = %method, path = %route, error = %err, "Unhandled error in handler");
                err.into_response()
            }
        }
    }
    .instrument(span.clone())
    .await;

    let response = request_id.attach(response);
    let status = response.status().as_u16();
    let elapsed = started.elapsed();
    guard
        .metrics()
        .record_request(service, method.as_str(), &route, status, elapsed);

    span.in_scope(|| {
        tracing::info!(status, duration_ms = millis(elapsed), "Request completed");
    });

    response
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}
