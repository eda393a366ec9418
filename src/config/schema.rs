//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration for the input guard.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Per-kind length bounds for text validation.
    pub validation: ValidationConfig,

    /// HTML sanitization allow lists.
    pub markup: MarkupConfig,

    /// File upload checks.
    pub upload: UploadConfig,

    /// Fixed-window rate limiting.
    pub rate_limit: RateLimitConfig,

    /// CSRF token handling.
    pub csrf: CsrfConfig,

    /// Defensive response headers.
    pub headers: HeadersConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ValidationConfig {
    pub max_lengths: MaxLengths,
}

/// Maximum accepted length, in characters, for each input kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MaxLengths {
    pub username: usize,
    pub email: usize,
    pub url: usize,
    pub search_query: usize,
    pub short_text: usize,
    pub long_text: usize,
}

impl Default for MaxLengths {
    fn default() -> Self {
        Self {
            username: 50,
            email: 100,
            url: 2048,
            search_query: 100,
            short_text: 255,
            long_text: 5000,
        }
    }
}

/// Allow lists handed to the HTML stripper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Tags kept in sanitized output. `script` and `style` are always removed.
    pub allowed_tags: Vec<String>,

    /// Attributes kept on any allowed tag.
    pub allowed_attributes: Vec<String>,

    /// URL schemes permitted in `href` and similar attributes.
    pub allowed_url_schemes: Vec<String>,

    /// Blank out `{{ }}`, `${` and `<% %>` template expressions.
    pub neutralize_templates: bool,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            allowed_tags: strings(&[
                "b", "i", "em", "strong", "a", "p", "br", "ul", "ol", "li", "code", "pre",
                "blockquote", "h3", "h4", "h5", "h6",
            ]),
            allowed_attributes: strings(&["href", "target", "rel", "class", "id"]),
            allowed_url_schemes: strings(&[
                "http", "https", "ftp", "ftps", "mailto", "tel", "callto", "cid", "xmpp",
            ]),
            neutralize_templates: true,
        }
    }
}

/// File upload policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum file size in bytes.
    pub max_size_bytes: u64,

    /// Accepted declared MIME types.
    pub allowed_mime_types: Vec<String>,

    /// Accepted extensions, lower-case with a leading dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            max_size_bytes: 10 * 1024 * 1024,
            allowed_mime_types: strings(&[
                "image/jpeg",
                "image/png",
                "image/gif",
                "application/pdf",
                "text/plain",
                "text/markdown",
            ]),
            allowed_extensions: strings(&[".jpg", ".jpeg", ".png", ".gif", ".pdf", ".txt", ".md"]),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable the per-client rate limit hook.
    pub enabled: bool,

    /// Requests allowed per window.
    pub max_requests: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Body of the 429 response.
    pub message: String,

    /// Interval between sweeps of expired records. No sweeping when unset.
    pub sweep_interval_secs: Option<u64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_ms: 15 * 60 * 1000,
            message: "Too many requests from this IP, please try again later.".to_string(),
            sweep_interval_secs: None,
        }
    }
}

/// CSRF configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Enforce tokens on state-changing requests.
    pub enabled: bool,

    /// Request header carrying the submitted token.
    pub header_name: String,

    /// JSON body field carrying the submitted token.
    pub body_field: String,

    /// Cookie holding the session id the stored token is keyed by.
    pub session_cookie: String,

    /// Session cookie lifetime. Stored tokens older than this are swept.
    pub session_max_age_secs: u64,

    /// Interval between sweeps of expired tokens. No sweeping when unset.
    pub sweep_interval_secs: Option<u64>,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            header_name: "x-csrf-token".to_string(),
            body_field: "_csrf".to_string(),
            session_cookie: "guard_session".to_string(),
            session_max_age_secs: 86_400,
            sweep_interval_secs: Some(300),
        }
    }
}

/// Defensive response headers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeadersConfig {
    /// Enable the security headers hook.
    pub enabled: bool,

    pub strict_transport_security: String,
    pub referrer_policy: String,
    pub permissions_policy: String,
    pub frame_options: String,

    /// Content-Security-Policy directives, e.g. `"default-src" = ["'self'"]`.
    /// A directive with no sources is emitted bare.
    pub content_security_policy: BTreeMap<String, Vec<String>>,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        let mut csp = BTreeMap::new();
        let mut directive = |name: &str, sources: &[&str]| {
            csp.insert(
                name.to_string(),
                sources.iter().map(|s| s.to_string()).collect(),
            );
        };
        directive("default-src", &["'self'"]);
        directive("script-src", &["'self'"]);
        directive("style-src", &["'self'", "'unsafe-inline'"]);
        directive("img-src", &["'self'", "data:", "https:", "blob:"]);
        directive("font-src", &["'self'"]);
        directive("connect-src", &["'self'"]);
        directive("object-src", &["'none'"]);
        directive("media-src", &["'self'"]);
        directive("frame-src", &["'none'"]);
        directive("frame-ancestors", &["'none'"]);
        directive("form-action", &["'self'"]);
        directive("upgrade-insecure-requests", &[]);

        Self {
            enabled: true,
            strict_transport_security: "max-age=31536000; includeSubDomains".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
            permissions_policy: "camera=(), microphone=(), geolocation=()".to_string(),
            frame_options: "DENY".to_string(),
            content_security_policy: csp,
        }
    }
}

impl HeadersConfig {
    /// Render the CSP directives into a header value.
    pub fn render_csp(&self) -> Option<String> {
        if self.content_security_policy.is_empty() {
            return None;
        }
        let rendered = self
            .content_security_policy
            .iter()
            .map(|(name, sources)| {
                if sources.is_empty() {
                    name.clone()
                } else {
                    format!("{} {}", name, sources.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join("; ");
        Some(rendered)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
