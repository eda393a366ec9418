//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! guard operations and request hooks produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stdout via tracing-subscriber fmt layer
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
