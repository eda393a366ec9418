//! End-to-end tests against a listening server.

use input_guard::config::GuardConfig;
use std::time::Duration;

mod common;

#[tokio::test]
async fn test_rate_limit_enforced_per_client() {
    let mut config = common::test_config();
    config.rate_limit.max_requests = 3;
    config.rate_limit.message = "slow down".to_string();
    let (addr, shutdown, _updates) = common::start_server(config).await;

    let client = reqwest::Client::new();
    let url = format!("http://{}/health", addr);

    for expected_remaining in ["2", "1", "0"] {
        let resp = client.get(&url).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["ratelimit-limit"], "3");
        assert_eq!(resp.headers()["ratelimit-remaining"], expected_remaining);
    }

    let resp = client.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), 429);
    assert!(resp.headers().contains_key("retry-after"));
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.text().await.unwrap(), "slow down");

    shutdown.trigger();
}

#[tokio::test]
async fn test_config_reload_applies_to_live_traffic() {
    let config = common::test_config();
    let (addr, shutdown, updates) = common::start_server(config.clone()).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/api/validate", addr);
    let body = serde_json::json!({ "input": "abcd", "kind": "username" });

    let resp: serde_json::Value = client.post(&url).json(&body).send().await.unwrap().json().await.unwrap();
    assert_eq!(resp["isValid"], true);

    let mut tightened: GuardConfig = config;
    tightened.validation.max_lengths.username = 3;
    updates.send(tightened).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let resp: serde_json::Value = client.post(&url).json(&body).send().await.unwrap().json().await.unwrap();
    assert_eq!(resp["isValid"], false);

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_echoed() {
    let (addr, shutdown, _updates) = common::start_server(common::test_config()).await;
    let resp = reqwest::Client::new()
        .get(format!("http://{}/health", addr))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "abc-123");
    shutdown.trigger();
}
