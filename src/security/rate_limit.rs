//! Per-client rate limiting hook.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::guard::rate_limit::{now_ms, RateLimitDecision};
use crate::http::server::AppState;
use crate::observability::metrics;

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Identifier used for the calling client: its peer IP when known.
fn client_key(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Seconds until the decision's window resets, rounded up.
fn reset_secs(decision: &RateLimitDecision) -> u64 {
    decision.reset_at_ms.saturating_sub(now_ms()).div_ceil(1000)
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(reset_secs(decision)));
}

/// Middleware function for fixed-window rate limiting.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let inner = state.inner.load_full();
    let config = &inner.config.rate_limit;
    if !config.enabled {
        return next.run(request).await;
    }

    let key = client_key(&request);
    let decision = inner
        .guard
        .limiter()
        .check(&key, config.max_requests, config.window_ms);

    if decision.allowed {
        let mut response = next.run(request).await;
        insert_rate_limit_headers(response.headers_mut(), &decision);
        response
    } else {
        tracing::warn!(client = %key, count = decision.count, limit = decision.limit, "Rate limit exceeded");
        metrics::record_rate_limited();
        let mut response = (StatusCode::TOO_MANY_REQUESTS, config.message.clone()).into_response();
        insert_rate_limit_headers(response.headers_mut(), &decision);
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(reset_secs(&decision)));
        response
    }
}
