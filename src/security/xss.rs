//! XSS protection hook.
//!
//! Escapes every top-level string field of a JSON object body before the
//! handler sees it and marks the response with `X-XSS-Protection`.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::guard::escape_special_chars;
use crate::http::server::AppState;
use crate::security::{buffer_body, is_json};

/// Escape the string values of a JSON object in place. Nested values and
/// non-object bodies are left alone. Returns how many fields changed.
pub fn escape_string_fields(body: &mut Value) -> usize {
    let Value::Object(map) = body else {
        return 0;
    };
    let mut changed = 0;
    for value in map.values_mut() {
        if let Value::String(s) = value {
            let escaped = escape_special_chars(s);
            if escaped != *s {
                *s = escaped;
                changed += 1;
            }
        }
    }
    changed
}

pub async fn xss_protection_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let req = if is_json(req.headers()) {
        let limit = state.inner.load().config.server.max_body_size;
        let (mut parts, bytes) = match buffer_body(req, limit).await {
            Ok(buffered) => buffered,
            Err(response) => return response,
        };

        let body = match serde_json::from_slice::<Value>(&bytes) {
            Ok(mut value) => {
                let changed = escape_string_fields(&mut value);
                if changed > 0 {
                    tracing::debug!(fields = changed, "Escaped request body fields");
                    // re-serializing an in-memory Value cannot fail
                    let rewritten = serde_json::to_vec(&value).unwrap_or_else(|_| bytes.to_vec());
                    parts.headers.remove(header::CONTENT_LENGTH);
                    Body::from(rewritten)
                } else {
                    Body::from(bytes)
                }
            }
            Err(_) => Body::from(bytes),
        };
        Request::from_parts(parts, body)
    } else {
        req
    };

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
    response
}
