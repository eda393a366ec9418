//! Allow-list HTML sanitization.
//!
//! The guard only supplies policy. Parsing and stripping are delegated to a
//! [`MarkupStripper`], backed by `ammonia` by default.

use ammonia::Builder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::config::schema::MarkupConfig;

/// Tags whose content is executable or can carry script. Never allowed.
const FORBIDDEN_TAGS: [&str; 2] = ["script", "style"];

/// Event-handler attributes (`onclick`, `onerror`, ...) run script. Never allowed.
pub fn is_event_handler_attribute(name: &str) -> bool {
    name.len() > 2 && name.as_bytes()[..2].eq_ignore_ascii_case(b"on")
}

static TEMPLATE_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{|\}\}|\$\{|&lt;%|%&gt;|<%|%>").expect("template expression pattern")
});

/// Narrow seam over an HTML stripping engine.
pub trait MarkupStripper: Send + Sync {
    /// Remove every tag, attribute and URL scheme not allowed by `policy`.
    fn strip(&self, html: &str, policy: &MarkupConfig) -> String;
}

/// [`MarkupStripper`] backed by `ammonia`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmmoniaStripper;

impl MarkupStripper for AmmoniaStripper {
    fn strip(&self, html: &str, policy: &MarkupConfig) -> String {
        let tags: HashSet<&str> = policy
            .allowed_tags
            .iter()
            .map(String::as_str)
            .filter(|tag| !FORBIDDEN_TAGS.iter().any(|f| tag.eq_ignore_ascii_case(f)))
            .collect();
        let attributes: HashSet<&str> = policy
            .allowed_attributes
            .iter()
            .map(String::as_str)
            .filter(|attr| !is_event_handler_attribute(attr))
            .collect();
        let schemes: HashSet<&str> = policy.allowed_url_schemes.iter().map(String::as_str).collect();

        // ammonia refuses to manage `rel` itself when callers allow it.
        let link_rel = if attributes.contains("rel") {
            None
        } else {
            Some("noopener noreferrer")
        };

        let mut builder = Builder::default();
        builder
            .tags(tags)
            .tag_attributes(HashMap::new())
            .generic_attributes(attributes)
            .url_schemes(schemes)
            .link_rel(link_rel)
            .strip_comments(true);
        builder.clean(html).to_string()
    }
}

/// Sanitize `input` with `stripper` under `policy`. Empty input yields an empty string.
pub fn sanitize_markup_with(stripper: &dyn MarkupStripper, input: &str, policy: &MarkupConfig) -> String {
    if input.is_empty() {
        return String::new();
    }

    let stripped = stripper.strip(input, policy);
    if policy.neutralize_templates {
        TEMPLATE_EXPR.replace_all(&stripped, " ").into_owned()
    } else {
        stripped
    }
}

/// Sanitize `input` with the default `ammonia` stripper and default allow lists.
pub fn sanitize_markup(input: &str) -> String {
    sanitize_markup_with(&AmmoniaStripper, input, &MarkupConfig::default())
}
