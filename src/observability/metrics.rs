//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by dispatch kind, status
//! - `gateway_request_duration_seconds` (histogram): latency by dispatch kind
//! - `gateway_locale_decisions_total` (counter): rewrites/redirects by locale
//! - `gateway_upstream_errors_total` (counter): failed upstream requests
//! - `gateway_rate_limited_total` (counter): rejected API requests by limited path
//!
//! Recording is a no-op until a recorder is installed, so tests and the
//! CLI can run the same code paths without an exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::locale::Locale;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_request(kind: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "dispatch" => kind,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "dispatch" => kind)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_locale_decision(kind: &'static str, locale: Locale) {
    metrics::counter!(
        "gateway_locale_decisions_total",
        "decision" => kind,
        "locale" => locale.as_str()
    )
    .increment(1);
}

pub fn record_upstream_error() {
    metrics::counter!("gateway_upstream_errors_total").increment(1);
}

pub fn record_rate_limited(path: &str) {
    metrics::counter!("gateway_rate_limited_total", "path" => path.to_string()).increment(1);
}
