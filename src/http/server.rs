//! HTTP server setup.
//!
//! # Responsibilities
//! - Mount the health and metrics routes next to the service's own routes
//! - Wrap everything in the hardening middleware
//! - Serve with graceful shutdown

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::http::middleware::{harden, Guard};
use crate::http::response::error_response;

/// Prometheus text exposition content type.
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Add the health and metrics routes to `app` and apply the middleware to
/// every route, including the fallback.
///
/// Body extractors (`Json`, `Bytes`, ...) are capped at `max_body_bytes`
/// instead of axum's 2 MiB default.
pub fn build_router(app: Router, guard: Guard) -> Router {
    let health_path = guard.config().health_path.clone();
    let metrics_path = guard.config().metrics_path.clone();
    let body_limit = usize::try_from(guard.config().max_body_bytes).unwrap_or(usize::MAX);

    app.route(&health_path, get(health_handler).with_state(guard.clone()))
        .route(&metrics_path, get(metrics_handler).with_state(guard.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(guard, harden))
}

async fn health_handler(State(guard): State<Guard>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": guard.config().service_name,
    }))
}

async fn metrics_handler(State(guard): State<Guard>) -> Response {
    match guard.metrics().render() {
        Some(body) => ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], body).into_response(),
        None => error_response(StatusCode::SERVICE_UNAVAILABLE, "Metrics unavailable"),
    }
}

/// HTTP server hosting one hardened service.
pub struct HttpServer {
    router: Router,
    guard: Guard,
}

impl HttpServer {
    /// Wrap `app` (the service's own routes) with the hardening stack.
    pub fn new(app: Router, guard: Guard) -> Self {
        let router = build_router(app, guard.clone()).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
        Self { router, guard }
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let config = self.guard.config();
        tracing::info!(
            address = %listener.local_addr()?,
            service = %config.service_name,
            timeout_secs = config.request_timeout_secs,
            max_body_bytes = config.max_body_bytes,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
