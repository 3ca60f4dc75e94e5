//! Stand-in inference service behind the request-hardening middleware.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ TraceLayer ──▶ harden ──────────────────────────────▶ handler
//!                              │ 1. admission (Content-Length)        │
//!                              │ 2. x-request-id (adopt / generate)   │
//!                              │ 3. timeout supervisor (spawned task) │
//!                              │ 4. metrics + completion log          │
//!   Client ◀──────────────────┴── response + x-request-id ◀──────────┘
//! ```
//!
//! Configuration comes from the environment (`SERVICE_NAME`,
//! `REQUEST_TIMEOUT_SECONDS`, `MAX_REQUEST_SIZE_BYTES`, `JSON_LOGGING`,
//! `LOG_LEVEL`, `BIND_ADDRESS`), optionally layered over a TOML file.

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::Path,
    routing::{get, post},
    Extension, Json, Router,
};
use clap::Parser;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use request_hardening::config::load_from_env;
use request_hardening::http::{Guard, HttpServer, RequestContext};
use request_hardening::observability::{init_logging, install_panic_hook};
use request_hardening::Shutdown;

#[derive(Parser)]
#[command(name = "request-hardening")]
#[command(about = "Demo service wrapped in the request-hardening middleware", long_about = None)]
struct Cli {
    /// TOML file layered under the environment.
    #[arg(short, long, env = "GUARD_CONFIG")]
    config: Option<PathBuf>,
}

/// Echo the JSON payload back, tagged with the request id.
async fn echo(Extension(ctx): Extension<RequestContext>, Json(payload): Json<Value>) -> Json<Value> {
    tracing::info!(bytes = ?ctx.content_length, "Echoing payload");
    Json(json!({
        "request_id": ctx.request_id.as_str(),
        "payload": payload,
    }))
}

/// Sleep for `ms` milliseconds, stopping early if the request is abandoned.
async fn sleep(Extension(ctx): Extension<RequestContext>, Path(ms): Path<u64>) -> Json<Value> {
    let remaining = ctx.remaining();
    if Duration::from_millis(ms) > remaining {
        tracing::warn!(requested_ms = ms, remaining_ms = remaining.as_millis() as u64, "Sleep will outlive the budget");
    }
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_millis(ms)) => {}
        _ = ctx.cancellation().cancelled() => {
            tracing::info!("Caller already answered, stopping work");
        }
    }
    Json(json!({ "slept_ms": ms }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_from_env(cli.config.as_deref())?;
    let format = init_logging(&config)?;
    install_panic_hook();

    tracing::info!(
        service = %config.service_name,
        log_format = ?format,
        "request-hardening v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let listener = TcpListener::bind(&config.bind_address).await?;

    let app = Router::new()
        .route("/v1/echo", post(echo))
        .route("/v1/sleep/{ms}", get(sleep));
    let server = HttpServer::new(app, Guard::from_config(config));

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
