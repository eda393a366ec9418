//! HTTP service subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, trace, timeout, body limit)
//!     → security hooks (rate limit, CSRF, XSS, headers)
//!     → handlers.rs (guard operations as JSON endpoints)
//!     → Send to client
//! ```

pub mod handlers;
pub mod server;

pub use server::{AppState, GuardInner, HttpServer};
