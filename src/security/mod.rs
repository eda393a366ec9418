//! Request hooks placed in front of handlers.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-IP fixed window, 429 when exhausted)
//!     → csrf.rs (state-changing methods need a matching token, else 403)
//!     → xss.rs (escape string fields of JSON bodies)
//!     → handler
//! Outgoing response:
//!     → headers.rs (defensive headers, strip server disclosure)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input, including X-Forwarded-* headers

pub mod csrf;
pub mod headers;
pub mod rate_limit;
pub mod xss;

use axum::{
    body::{Body, Bytes},
    http::{header, request::Parts, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
};

/// Read the whole request body, bounded by `limit` bytes.
pub(crate) async fn buffer_body(req: Request<Body>, limit: usize) -> Result<(Parts, Bytes), Response> {
    let (parts, body) = req.into_parts();
    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => Ok((parts, bytes)),
        Err(e) => {
            tracing::warn!(error = %e, limit, "Failed to buffer request body");
            Err((StatusCode::PAYLOAD_TOO_LARGE, "Request body too large or unreadable").into_response())
        }
    }
}

pub(crate) fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}
