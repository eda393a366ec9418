//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, windows > 0)
//! - Check that addresses, header names and header values are well formed
//! - Refuse allow lists that would let executable markup through
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderName, HeaderValue};
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GuardConfig;
use crate::guard::markup::is_event_handler_attribute;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Server
    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("server.bind_address", "must be a socket address"));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }
    if config.server.max_body_size == 0 {
        errors.push(ValidationError::new("server.max_body_size", "must be greater than 0"));
    }

    // Validation limits
    let lengths = &config.validation.max_lengths;
    for (name, value) in [
        ("username", lengths.username),
        ("email", lengths.email),
        ("url", lengths.url),
        ("search_query", lengths.search_query),
        ("short_text", lengths.short_text),
        ("long_text", lengths.long_text),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(
                format!("validation.max_lengths.{}", name),
                "must be greater than 0",
            ));
        }
    }

    // Markup
    for tag in &config.markup.allowed_tags {
        if tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style") {
            errors.push(ValidationError::new(
                "markup.allowed_tags",
                format!("'{}' can never be allowed", tag),
            ));
        }
    }

    for attr in &config.markup.allowed_attributes {
        if is_event_handler_attribute(attr) {
            errors.push(ValidationError::new(
                "markup.allowed_attributes",
                format!("'{}' is an event handler and can never be allowed", attr),
            ));
        }
    }

    // Upload
    if config.upload.max_size_bytes == 0 {
        errors.push(ValidationError::new("upload.max_size_bytes", "must be greater than 0"));
    }
    for ext in &config.upload.allowed_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            errors.push(ValidationError::new(
                "upload.allowed_extensions",
                format!("'{}' must be a dot followed by the extension", ext),
            ));
        }
    }

    // Rate limit
    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
    }
    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::new("rate_limit.window_ms", "must be greater than 0"));
    }
    if config.rate_limit.sweep_interval_secs == Some(0) {
        errors.push(ValidationError::new(
            "rate_limit.sweep_interval_secs",
            "must be greater than 0 when set",
        ));
    }

    // CSRF
    if HeaderName::from_bytes(config.csrf.header_name.as_bytes()).is_err() {
        errors.push(ValidationError::new("csrf.header_name", "must be a valid header name"));
    }
    if config.csrf.body_field.is_empty() {
        errors.push(ValidationError::new("csrf.body_field", "must not be empty"));
    }
    if config.csrf.session_cookie.is_empty()
        || config.csrf.session_cookie.contains(|c: char| c == '=' || c == ';' || c.is_whitespace())
    {
        errors.push(ValidationError::new("csrf.session_cookie", "must be a valid cookie name"));
    }
    if config.csrf.session_max_age_secs == 0 {
        errors.push(ValidationError::new("csrf.session_max_age_secs", "must be greater than 0"));
    }
    if config.csrf.sweep_interval_secs == Some(0) {
        errors.push(ValidationError::new(
            "csrf.sweep_interval_secs",
            "must be greater than 0 when set",
        ));
    }

    // Headers
    let headers = &config.headers;
    for (name, value) in [
        ("headers.strict_transport_security", &headers.strict_transport_security),
        ("headers.referrer_policy", &headers.referrer_policy),
        ("headers.permissions_policy", &headers.permissions_policy),
        ("headers.frame_options", &headers.frame_options),
    ] {
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::new(name, "must be a valid header value"));
        }
    }
    if let Some(csp) = headers.render_csp() {
        if HeaderValue::from_str(&csp).is_err() {
            errors.push(ValidationError::new(
                "headers.content_security_policy",
                "must render to a valid header value",
            ));
        }
    }

    // Observability
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GuardConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = GuardConfig::default();
        config.server.bind_address = "not an address".into();
        config.rate_limit.window_ms = 0;
        config.rate_limit.sweep_interval_secs = Some(0);
        config.validation.max_lengths.email = 0;
        config.upload.allowed_extensions.push("exe".into());
        config.markup.allowed_tags.push("Script".into());
        config.csrf.header_name = "bad header".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "server.bind_address",
                "validation.max_lengths.email",
                "markup.allowed_tags",
                "upload.allowed_extensions",
                "rate_limit.window_ms",
                "rate_limit.sweep_interval_secs",
                "csrf.header_name",
            ]
        );
    }

    #[test]
    fn test_event_handler_attribute_rejected() {
        let mut config = GuardConfig::default();
        config.markup.allowed_attributes.push("onMouseOver".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "markup.allowed_attributes");
    }

    #[test]
    fn test_bad_header_value() {
        let mut config = GuardConfig::default();
        config.headers.referrer_policy = "no\nnewlines".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "headers.referrer_policy: must be a valid header value");
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = GuardConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());
        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
