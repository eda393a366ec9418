//! In-process tests of the guard endpoints and global hooks.

use axum::http::{header, StatusCode};
use input_guard::http::HttpServer;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_health_has_security_headers() {
    let router = HttpServer::new(common::test_config()).router();
    let (status, headers, body) = common::send(&router, common::get_request("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::REFERRER_POLICY], "strict-origin-when-cross-origin");
    assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    assert!(headers.contains_key("permissions-policy"));
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert!(!headers.contains_key("x-powered-by"));
    assert!(!headers.contains_key(header::SERVER));
    assert!(headers.contains_key("x-request-id"));
    assert!(headers.contains_key("ratelimit-limit"));
}

#[tokio::test]
async fn test_headers_can_be_disabled() {
    let mut config = common::test_config();
    config.headers.enabled = false;
    let router = HttpServer::new(config).router();
    let (_, headers, _) = common::send(&router, common::get_request("/health")).await;
    assert!(!headers.contains_key(header::X_FRAME_OPTIONS));
}

#[tokio::test]
async fn test_validate_email() {
    let router = HttpServer::new(common::test_config()).router();
    let (status, _, body) = common::send(
        &router,
        common::json_request(
            "POST",
            "/api/validate",
            &json!({ "input": " user@example.COM ", "kind": "email" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "isValid": true, "sanitized": "user@example.com", "errors": [] })
    );
}

#[tokio::test]
async fn test_validate_defaults_to_generic_text() {
    let router = HttpServer::new(common::test_config()).router();
    let (_, _, body) = common::send(
        &router,
        common::json_request(
            "POST",
            "/api/validate",
            &json!({ "input": "<script>alert(1)</script>hello <i>" }),
        ),
    )
    .await;

    assert_eq!(body["isValid"], true);
    assert_eq!(body["sanitized"], "hello &lt;i&gt;");
}

#[tokio::test]
async fn test_validate_too_long() {
    let router = HttpServer::new(common::test_config()).router();
    let (_, _, body) = common::send(
        &router,
        common::json_request(
            "POST",
            "/api/validate",
            &json!({ "input": "a".repeat(101), "kind": "searchQuery" }),
        ),
    )
    .await;

    assert_eq!(body["isValid"], false);
    assert_eq!(body["sanitized"], "");
    assert_eq!(
        body["errors"],
        json!(["Input exceeds maximum length of 100 characters"])
    );
}

#[tokio::test]
async fn test_sanitize_markup_endpoint() {
    let router = HttpServer::new(common::test_config()).router();
    let (status, _, body) = common::send(
        &router,
        common::json_request(
            "POST",
            "/api/sanitize/markup",
            &json!({ "html": "<p onclick=\"x()\">ok<script>bad()</script></p>" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["html"], "<p>ok</p>");
}

#[tokio::test]
async fn test_sanitize_markup_with_policy_override() {
    let router = HttpServer::new(common::test_config()).router();
    let (_, _, body) = common::send(
        &router,
        common::json_request(
            "POST",
            "/api/sanitize/markup",
            &json!({
                "html": "<p>a</p><b>b</b>",
                "policy": { "allowed_tags": ["b"] }
            }),
        ),
    )
    .await;

    assert_eq!(body["html"], "a<b>b</b>");
}

#[tokio::test]
async fn test_policy_override_cannot_allow_event_handlers() {
    let router = HttpServer::new(common::test_config()).router();
    let (_, _, body) = common::send(
        &router,
        common::json_request(
            "POST",
            "/api/sanitize/markup",
            &json!({
                "html": "<p onclick=\"steal()\">x</p>",
                "policy": { "allowed_tags": ["p"], "allowed_attributes": ["onclick", "onerror"] }
            }),
        ),
    )
    .await;

    assert_eq!(body["html"], "<p>x</p>");
}

#[tokio::test]
async fn test_sanitize_json_endpoint() {
    let router = HttpServer::new(common::test_config()).router();
    let (_, _, body) = common::send(
        &router,
        common::json_request(
            "POST",
            "/api/sanitize/json",
            &json!({ "__proto__": { "x": 1 }, "name": "<b>hi</b>", "n": 5 }),
        ),
    )
    .await;

    assert_eq!(body, json!({ "name": "&lt;b&gt;hi&lt;&#x2F;b&gt;", "n": 5 }));
}

#[tokio::test]
async fn test_file_check_endpoint() {
    let router = HttpServer::new(common::test_config()).router();
    let (_, _, body) = common::send(
        &router,
        common::json_request(
            "POST",
            "/api/files/check",
            &json!({ "file": {
                "sizeBytes": 2048,
                "mimeType": "application/pdf",
                "fileName": "invoice.pdf.exe"
            }}),
        ),
    )
    .await;

    assert_eq!(body["isValid"], false);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.contains(&json!("Suspicious filename detected")));

    let (_, _, body) = common::send(
        &router,
        common::json_request("POST", "/api/files/check", &json!({})),
    )
    .await;
    assert_eq!(body, json!({ "isValid": false, "errors": ["No file provided"] }));
}

#[tokio::test]
async fn test_malformed_json_is_client_error() {
    let router = HttpServer::new(common::test_config()).router();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/validate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, headers, _) = common::send(&router, request).await;
    assert!(status.is_client_error());
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
}
