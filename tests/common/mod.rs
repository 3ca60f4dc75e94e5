//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use request_hardening::config::GuardConfig;
use request_hardening::http::{build_router, Guard};
use request_hardening::observability::metrics::PrometheusMetrics;

pub const SERVICE: &str = "test-service";

/// Config with a short budget so timeout tests stay quick.
pub fn test_config(timeout_secs: f64, max_body_bytes: u64) -> GuardConfig {
    GuardConfig {
        service_name: SERVICE.to_string(),
        request_timeout_secs: timeout_secs,
        max_body_bytes,
        ..GuardConfig::default()
    }
}

/// Guard with its own, fresh Prometheus registry.
pub fn test_guard(config: GuardConfig) -> Guard {
    Guard::new(config, Arc::new(PrometheusMetrics::new().unwrap()))
}

pub fn hardened(app: Router, config: GuardConfig) -> (Router, Guard) {
    let guard = test_guard(config);
    (build_router(app, guard.clone()), guard)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Value of the first sample of `name` whose labels include every pair in
/// `labels`. Histogram children (`_bucket`, `_sum`, `_count`) are only
/// matched when named explicitly.
pub fn sample(exposition: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    exposition
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(name)
                .map(|rest| rest.starts_with('{') || rest.starts_with(' '))
                .unwrap_or(false)
        })
        .filter(|line| labels.iter().all(|(k, v)| line.contains(&format!("{}=\"{}\"", k, v))))
        .find_map(|line| line.rsplit(' ').next().and_then(|v| v.parse().ok()))
}

pub fn in_flight(guard: &Guard) -> f64 {
    let text = guard.metrics().render().unwrap();
    sample(&text, "http_requests_in_flight", &[("service", SERVICE)]).unwrap_or(0.0)
}
