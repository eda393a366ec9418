//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use input_guard::config::GuardConfig;
use input_guard::http::HttpServer;
use input_guard::lifecycle::Shutdown;
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Default config with a quota large enough not to interfere.
pub fn test_config() -> GuardConfig {
    let mut config = GuardConfig::default();
    config.server.bind_address = "127.0.0.1:0".to_string();
    config.rate_limit.max_requests = 10_000;
    config
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Send a request through the router in-process.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, headers, body)
}

/// Start a real server on an ephemeral port.
pub async fn start_server(
    config: GuardConfig,
) -> (SocketAddr, Shutdown, mpsc::UnboundedSender<GuardConfig>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    (addr, shutdown, updates_tx)
}
