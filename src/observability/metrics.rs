//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define mock server metrics (requests, latency, injected faults)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `mock_requests_total` (counter): requests by method, route, status
//! - `mock_request_duration_seconds` (histogram): latency incl. simulated delay
//! - `mock_simulated_failures_total` (counter): fail-simulation hits by route
//! - `mock_rate_limited_total` (counter): rate-limit rejections by route
//! - `mock_upstream_errors_total` (counter): proxy failures by route, kind
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels use the route pattern, never the raw path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("mock_requests_total", &labels).increment(1);
    metrics::histogram!("mock_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_simulated_failure(route: &str) {
    metrics::counter!("mock_simulated_failures_total", "route" => route.to_string()).increment(1);
}

pub fn record_rate_limited(route: &str) {
    metrics::counter!("mock_rate_limited_total", "route" => route.to_string()).increment(1);
}

pub fn record_upstream_error(route: &str, kind: &'static str) {
    metrics::counter!("mock_upstream_errors_total", "route" => route.to_string(), "kind" => kind).increment(1);
}
