//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor a configured level is available.
pub const DEFAULT_FILTER: &str = "input_guard=debug,tower_http=debug";

/// Build the env filter: `RUST_LOG` wins, then `level`, then [`DEFAULT_FILTER`].
pub fn build_filter(level: Option<&str>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    level
        .and_then(|level| EnvFilter::try_new(format!("input_guard={},tower_http={}", level, level)).ok())
        .unwrap_or_else(|| DEFAULT_FILTER.into())
}

/// Install the global tracing subscriber. Safe to call more than once.
pub fn init_logging(level: Option<&str>) {
    let _ = tracing_subscriber::registry()
        .with(build_filter(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
