//! JSON endpoints exposing guard operations.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::schema::MarkupConfig;
use crate::guard::{FileCheck, FileDescriptor, InputKind, ValidationResult};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::csrf::cookie_value;

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub input: String,
    #[serde(default = "default_kind")]
    pub kind: InputKind,
}

fn default_kind() -> InputKind {
    InputKind::ShortText
}

#[derive(Debug, Deserialize)]
pub struct MarkupRequest {
    pub html: String,
    /// Overrides the configured allow lists for this call.
    #[serde(default)]
    pub policy: Option<MarkupConfig>,
}

#[derive(Debug, Serialize)]
pub struct MarkupResponse {
    pub html: String,
}

#[derive(Debug, Deserialize)]
pub struct FileCheckRequest {
    #[serde(default)]
    pub file: Option<FileDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct CsrfTokenResponse {
    pub token: String,
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Json<ValidationResult> {
    let inner = state.inner.load();
    Json(inner.guard.validate(&req.input, req.kind))
}

pub async fn sanitize_markup(
    State(state): State<AppState>,
    Json(req): Json<MarkupRequest>,
) -> Json<MarkupResponse> {
    let inner = state.inner.load();
    let html = match &req.policy {
        Some(policy) => inner.guard.sanitize_markup_with(&req.html, policy),
        None => inner.guard.sanitize_markup(&req.html),
    };
    metrics::record_sanitization("markup");
    Json(MarkupResponse { html })
}

pub async fn sanitize_json(State(state): State<AppState>, Json(body): Json<Value>) -> Json<Value> {
    let inner = state.inner.load();
    metrics::record_sanitization("json");
    Json(inner.guard.sanitize_json(&body))
}

pub async fn check_file(
    State(state): State<AppState>,
    Json(req): Json<FileCheckRequest>,
) -> Json<FileCheck> {
    let inner = state.inner.load();
    Json(inner.guard.validate_file_upload(req.file.as_ref()))
}

/// Issue a fresh CSRF token bound to the caller's session, creating the
/// session cookie when the caller has none.
///
/// A cookie is only trusted when it names a session this server issued;
/// any other value gets a freshly minted session id.
pub async fn issue_csrf_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let inner = state.inner.load_full();
    let csrf = &inner.config.csrf;
    let cookie_name = &csrf.session_cookie;

    let existing = cookie_value(&headers, cookie_name)
        .filter(|session_id| state.csrf_store.get(session_id).is_some());
    let session_id = existing
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let token = inner.guard.generate_csrf_token();
    state.csrf_store.set(&session_id, token.clone());
    tracing::debug!(new_session = existing.is_none(), "Issued CSRF token");

    let mut response = Json(CsrfTokenResponse { token }).into_response();
    if existing.is_none() {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age={}",
            cookie_name, session_id, csrf.session_max_age_secs
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

/// Form submission endpoint behind the CSRF and XSS hooks. Echoes the body
/// as the handler received it.
pub async fn submit(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "received": body }))
}
