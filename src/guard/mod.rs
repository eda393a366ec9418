//! Input guard: the gate between untrusted input and everything downstream.
//!
//! # Data Flow
//! ```text
//! untrusted string / file / JSON
//!     → text.rs      (trim, length bound, per-kind policy)
//!     → markup.rs    (allow-list HTML stripping)
//!     → file.rs      (size, MIME, extension, double extension)
//!     → json.rs      (prototype keys, string escaping)
//!     → escape.rs    (final HTML entity escaping)
//!
//! per-client quota:  rate_limit.rs (fixed window over a RateLimitStore)
//! state-changing:    csrf.rs (token issue, constant-time compare)
//! ```
//!
//! # Design Decisions
//! - Fail closed, report don't throw: every operation returns a value
//! - Policy is data (config structs); engines sit behind traits
//! - Rate-limit storage is owned by the host, never a global

pub mod csrf;
pub mod escape;
pub mod file;
pub mod json;
pub mod markup;
pub mod rate_limit;
pub mod text;

use serde_json::Value;
use std::sync::Arc;

use crate::config::schema::{GuardConfig, MarkupConfig, MaxLengths, UploadConfig};
use crate::observability::metrics;

pub use csrf::{constant_time_eq, generate_csrf_token, validate_csrf_token, CsrfTokenStore, InMemoryCsrfStore};
pub use escape::escape_special_chars;
pub use file::{validate_file_upload, FileCheck, FileDescriptor};
pub use json::sanitize_json;
pub use markup::{sanitize_markup, sanitize_markup_with, AmmoniaStripper, MarkupStripper};
pub use rate_limit::{FixedWindowLimiter, InMemoryRateLimitStore, RateLimitDecision, RateLimitRecord, RateLimitStore};
pub use text::{validate_input, InputKind, ValidationResult};

/// Validation, sanitization and rate limiting under one policy.
#[derive(Clone)]
pub struct InputGuard {
    limits: MaxLengths,
    markup: MarkupConfig,
    upload: UploadConfig,
    stripper: Arc<dyn MarkupStripper>,
    limiter: FixedWindowLimiter,
}

impl InputGuard {
    /// Guard with the `ammonia` stripper and an in-memory rate-limit store.
    pub fn new(config: &GuardConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(AmmoniaStripper),
            Arc::new(InMemoryRateLimitStore::new()),
        )
    }

    pub fn with_parts(
        config: &GuardConfig,
        stripper: Arc<dyn MarkupStripper>,
        store: Arc<dyn RateLimitStore>,
    ) -> Self {
        Self {
            limits: config.validation.max_lengths.clone(),
            markup: config.markup.clone(),
            upload: config.upload.clone(),
            stripper,
            limiter: FixedWindowLimiter::new(store),
        }
    }

    /// A guard under a new policy that keeps this guard's stripper and
    /// rate-limit store, so counters survive a config reload.
    pub fn reconfigured(&self, config: &GuardConfig) -> Self {
        Self::with_parts(config, self.stripper.clone(), self.limiter.store().clone())
    }

    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    pub fn sanitize_markup(&self, input: &str) -> String {
        sanitize_markup_with(self.stripper.as_ref(), input, &self.markup)
    }

    /// Sanitize under an explicit allow list instead of the configured one.
    pub fn sanitize_markup_with(&self, input: &str, policy: &MarkupConfig) -> String {
        sanitize_markup_with(self.stripper.as_ref(), input, policy)
    }

    pub fn validate(&self, input: &str, kind: InputKind) -> ValidationResult {
        let result = validate_input(input, kind, &self.limits);
        if !result.is_valid {
            tracing::debug!(kind = %kind, errors = ?result.errors, "Input rejected");
        }
        metrics::record_validation(kind.as_str(), result.is_valid);
        result
    }

    pub fn validate_file_upload(&self, file: Option<&FileDescriptor>) -> FileCheck {
        self.validate_file_upload_with(file, &self.upload)
    }

    pub fn validate_file_upload_with(&self, file: Option<&FileDescriptor>, policy: &UploadConfig) -> FileCheck {
        let check = validate_file_upload(file, policy);
        if !check.is_valid {
            tracing::debug!(
                file_name = file.map(|f| f.file_name.as_str()).unwrap_or("<none>"),
                errors = ?check.errors,
                "File rejected"
            );
        }
        metrics::record_file_check(check.is_valid);
        check
    }

    pub fn check_rate_limit(&self, identifier: &str, max_requests: u32, window_ms: u64) -> bool {
        self.limiter.check_rate_limit(identifier, max_requests, window_ms)
    }

    pub fn generate_csrf_token(&self) -> String {
        generate_csrf_token()
    }

    pub fn validate_csrf_token(&self, token: Option<&str>, stored: Option<&str>) -> bool {
        validate_csrf_token(token, stored)
    }

    pub fn sanitize_json(&self, data: &Value) -> Value {
        sanitize_json(data)
    }
}

impl Default for InputGuard {
    fn default() -> Self {
        Self::new(&GuardConfig::default())
    }
}
