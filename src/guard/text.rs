//! Typed validation of short user-supplied strings.
//!
//! Each [`InputKind`] has a length bound and a policy: pattern kinds
//! (email, url, username) reject on mismatch, free-text kinds strip known
//! hostile sequences. Every accepted value is HTML-escaped last.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::schema::MaxLengths;
use crate::guard::escape::escape_special_chars;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_+.~#?&/=]*)$",
    )
    .expect("url pattern")
});

static ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("alphanumeric pattern"));

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script>").expect("script block pattern"));

static SQL_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(SELECT|UPDATE|DELETE|INSERT|DROP|CREATE|ALTER|EXEC|EXECUTE|UNION|FROM|WHERE)\b",
    )
    .expect("sql keyword pattern")
});

static PATH_TRAVERSAL: Lazy<Regex> = Lazy::new(|| {
    // `../` and `..\` first, then a bare `..`; the separator before a sequence is kept
    Regex::new(r"\.\./|\.\.\\|\.\.").expect("path traversal pattern")
});

static SHELL_METACHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[;&|`$()]").expect("shell metacharacter pattern"));

/// Declared type of a piece of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputKind {
    Email,
    Url,
    Username,
    SearchQuery,
    /// Generic text, and the fallback for unknown kinds.
    #[serde(alias = "genericText", alias = "text")]
    ShortText,
    LongText,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Email => "email",
            InputKind::Url => "url",
            InputKind::Username => "username",
            InputKind::SearchQuery => "searchQuery",
            InputKind::ShortText => "shortText",
            InputKind::LongText => "longText",
        }
    }

    /// Length bound for this kind under the given limits.
    pub fn max_length(&self, limits: &MaxLengths) -> usize {
        match self {
            InputKind::Email => limits.email,
            InputKind::Url => limits.url,
            InputKind::Username => limits.username,
            InputKind::SearchQuery => limits.search_query,
            InputKind::ShortText => limits.short_text,
            InputKind::LongText => limits.long_text,
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(InputKind::Email),
            "url" => Ok(InputKind::Url),
            "username" => Ok(InputKind::Username),
            "searchQuery" | "search-query" => Ok(InputKind::SearchQuery),
            "shortText" | "short-text" | "genericText" | "text" => Ok(InputKind::ShortText),
            "longText" | "long-text" => Ok(InputKind::LongText),
            other => Err(format!("unknown input kind: {}", other)),
        }
    }
}

/// Outcome of validating one input.
///
/// `is_valid` is true exactly when `errors` is empty, and `sanitized` is
/// empty whenever validation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub sanitized: String,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn accepted(sanitized: String) -> Self {
        Self {
            is_valid: true,
            sanitized,
            errors: Vec::new(),
        }
    }

    fn rejected(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            sanitized: String::new(),
            errors: vec![error.into()],
        }
    }
}

/// Validate and sanitize `input` as the declared `kind`.
pub fn validate_input(input: &str, kind: InputKind, limits: &MaxLengths) -> ValidationResult {
    if input.is_empty() {
        return ValidationResult::rejected("Input is required");
    }
    let trimmed = input.trim();

    let max_length = kind.max_length(limits);
    if trimmed.chars().count() > max_length {
        return ValidationResult::rejected(format!(
            "Input exceeds maximum length of {} characters",
            max_length
        ));
    }

    let cleaned = match kind {
        InputKind::Email => {
            if !EMAIL.is_match(trimmed) {
                return ValidationResult::rejected("Invalid email format");
            }
            trimmed.to_lowercase()
        }
        InputKind::Url => {
            if !URL.is_match(trimmed) {
                return ValidationResult::rejected("Invalid URL format");
            }
            trimmed.to_string()
        }
        InputKind::Username => {
            if !ALPHANUMERIC.is_match(trimmed) {
                return ValidationResult::rejected("Username can only contain letters and numbers");
            }
            trimmed.to_string()
        }
        InputKind::SearchQuery => {
            let without_sql = SQL_KEYWORDS.replace_all(trimmed, "");
            SHELL_METACHARS.replace_all(&without_sql, "").into_owned()
        }
        InputKind::ShortText | InputKind::LongText => {
            let without_scripts = SCRIPT_BLOCK.replace_all(trimmed, "");
            PATH_TRAVERSAL.replace_all(&without_scripts, "").into_owned()
        }
    };

    ValidationResult::accepted(escape_special_chars(&cleaned))
}
