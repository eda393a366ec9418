//! Input validation and sanitization for untrusted user input.
//!
//! [`InputGuard`] validates typed strings, strips HTML to an allow list,
//! checks upload metadata, scrubs JSON payloads, rate-limits clients with a
//! fixed window and issues/compares CSRF tokens. The [`security`] module
//! wraps those operations as axum middleware, and [`http`] serves them.

pub mod config;
pub mod guard;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GuardConfig;
pub use guard::{InputGuard, InputKind, ValidationResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
