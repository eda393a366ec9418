//! Defensive response headers.
//!
//! # Responsibilities
//! - Add security response headers to every response
//! - Remove headers that disclose the server technology

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::config::schema::HeadersConfig;
use crate::http::server::AppState;

const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");
const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// Set the configured security headers on `headers` and strip disclosure headers.
pub fn apply_security_headers(headers: &mut HeaderMap, config: &HeadersConfig) {
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
    headers.insert(header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off"));

    let configured = [
        (header::X_FRAME_OPTIONS, config.frame_options.as_str()),
        (header::STRICT_TRANSPORT_SECURITY, config.strict_transport_security.as_str()),
        (header::REFERRER_POLICY, config.referrer_policy.as_str()),
        (PERMISSIONS_POLICY, config.permissions_policy.as_str()),
    ];
    for (name, value) in configured {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(_) => tracing::warn!(header = %name, "Skipping invalid security header value"),
        }
    }

    if let Some(csp) = config.render_csp() {
        if let Ok(value) = HeaderValue::from_str(&csp) {
            headers.insert(header::CONTENT_SECURITY_POLICY, value);
        }
    }

    headers.remove(X_POWERED_BY);
    headers.remove(header::SERVER);
}

/// Middleware adding security headers to every response.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let inner = state.inner.load_full();
    let mut response = next.run(request).await;
    if inner.config.headers.enabled {
        apply_security_headers(response.headers_mut(), &inner.config.headers);
    }
    response
}
