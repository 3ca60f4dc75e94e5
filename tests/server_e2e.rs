//! End-to-end tests against a real listener.

use std::net::SocketAddr;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use request_hardening::http::HttpServer;
use request_hardening::Shutdown;

mod common;
use common::{sample, test_config, test_guard, SERVICE};

async fn start(app: Router, timeout_secs: f64) -> (SocketAddr, Shutdown, request_hardening::Guard) {
    let guard = test_guard(test_config(timeout_secs, 10 * 1024 * 1024));
    let server = HttpServer::new(app, guard.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown, guard)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clients() {
    let app = Router::new().route("/v1/ok", get(|| async { "ok" }));
    let (addr, shutdown, guard) = start(app, 30.0).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let url = format!("http://{}/v1/ok", addr);

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let client = client.clone();
            let url = url.clone();
            tokio::spawn(async move {
                let res = client.get(&url).send().await.expect("server unreachable");
                let id = res.headers().get("x-request-id").map(|v| v.to_str().unwrap().to_string());
                (res.status(), id)
            })
        })
        .collect();

    let mut ids = std::collections::HashSet::new();
    for task in tasks {
        let (status, id) = task.await.unwrap();
        assert_eq!(status, 200);
        assert!(ids.insert(id.expect("missing x-request-id")));
    }
    assert_eq!(ids.len(), 50);

    let scrape = client
        .get(format!("http://{}/metrics", addr))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(
        sample(&scrape, "http_requests_total", &[("path", "/v1/ok"), ("status", "200")]),
        Some(50.0)
    );

    let text = guard.metrics().render().unwrap();
    assert_eq!(sample(&text, "http_requests_in_flight", &[("service", SERVICE)]), Some(0.0));

    shutdown.trigger();
}

#[tokio::test]
async fn test_correlation_and_timeout_over_the_wire() {
    let app = Router::new().route(
        "/v1/forecast",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            "ok"
        }),
    );
    let (addr, shutdown, _guard) = start(app, 0.3).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{}/v1/forecast", addr))
        .header("x-request-id", "ui-session-19")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 504);
    assert_eq!(res.headers()["x-request-id"], "ui-session-19");
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"error": "Request timeout"}));

    let health = client.get(format!("http://{}/health", addr)).send().await.unwrap();
    assert_eq!(health.status(), 200);
    let health: serde_json::Value = health.json().await.unwrap();
    assert_eq!(health["service"], SERVICE);

    shutdown.trigger();
}
