//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, route, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `polls_created_total`, `votes_cast_total` (counters)
//! - `resource_fetch_failures_total` (counter): degraded sub-fetches by resource
//! - `infrastructure_healthy_resources`, `infrastructure_total_resources` (gauges)
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("http_requests_total", &labels[..]).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels[..])
        .record(start.elapsed().as_secs_f64());
}

pub fn record_poll_created() {
    metrics::counter!("polls_created_total").increment(1);
}

pub fn record_vote_cast() {
    metrics::counter!("votes_cast_total").increment(1);
}

/// Record a sub-resource fetch that degraded to its default.
pub fn record_fetch_failure(resource: &'static str) {
    metrics::counter!("resource_fetch_failures_total", "resource" => resource).increment(1);
}

/// Record the health roll-up of the latest infrastructure snapshot.
pub fn record_infrastructure_snapshot(healthy: usize, total: usize) {
    metrics::gauge!("infrastructure_healthy_resources").set(healthy as f64);
    metrics::gauge!("infrastructure_total_resources").set(total as f64);
}
