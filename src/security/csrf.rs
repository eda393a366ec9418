//! CSRF protection hook.
//!
//! State-changing requests must carry a token, in a header or a JSON body
//! field, that matches the token stored for the caller's session.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::{buffer_body, is_json};

/// Methods that change server state and so require a token.
pub fn is_state_changing(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::DELETE | Method::PATCH)
}

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

pub async fn csrf_protection_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let inner = state.inner.load_full();
    let csrf = &inner.config.csrf;
    if !csrf.enabled || !is_state_changing(req.method()) {
        return next.run(req).await;
    }

    let stored = cookie_value(req.headers(), &csrf.session_cookie)
        .and_then(|session_id| state.csrf_store.get(&session_id));

    let header_token = req
        .headers()
        .get(csrf.header_name.as_str())
        .and_then(|v| v.to_str().ok())
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    let (req, submitted) = match header_token {
        Some(token) => (req, Some(token)),
        None if is_json(req.headers()) => {
            let (parts, bytes) = match buffer_body(req, inner.config.server.max_body_size).await {
                Ok(buffered) => buffered,
                Err(response) => return response,
            };
            let token = serde_json::from_slice::<Value>(&bytes).ok().and_then(|body| {
                body.get(&csrf.body_field)
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });
            (Request::from_parts(parts, Body::from(bytes)), token)
        }
        None => (req, None),
    };

    if inner
        .guard
        .validate_csrf_token(submitted.as_deref(), stored.as_deref())
    {
        return next.run(req).await;
    }

    let reason = match (&submitted, &stored) {
        (None, _) => "missing_token",
        (_, None) => "no_session_token",
        _ => "mismatch",
    };
    tracing::warn!(method = %req.method(), path = %req.uri().path(), reason, "CSRF check failed");
    metrics::record_csrf_rejected(reason);
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "Invalid CSRF token" })),
    )
        .into_response()
}
