//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_validations_total` (counter): text validations by kind, outcome
//! - `guard_files_checked_total` (counter): upload checks by outcome
//! - `guard_sanitizations_total` (counter): markup/JSON sanitizations by target
//! - `guard_rate_limited_total` (counter): requests denied by the rate limit
//! - `guard_csrf_rejections_total` (counter): requests denied by the CSRF hook
//!
//! Recording is a no-op until a recorder is installed, so library callers
//! that never call [`init_metrics`] pay nothing.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "accepted"
    } else {
        "rejected"
    }
}

pub fn record_validation(kind: &'static str, valid: bool) {
    metrics::counter!("guard_validations_total", "kind" => kind, "outcome" => outcome(valid)).increment(1);
}

pub fn record_file_check(valid: bool) {
    metrics::counter!("guard_files_checked_total", "outcome" => outcome(valid)).increment(1);
}

pub fn record_sanitization(target: &'static str) {
    metrics::counter!("guard_sanitizations_total", "target" => target).increment(1);
}

pub fn record_rate_limited() {
    metrics::counter!("guard_rate_limited_total").increment(1);
}

pub fn record_csrf_rejected(reason: &'static str) {
    metrics::counter!("guard_csrf_rejections_total", "reason" => reason).increment(1);
}
