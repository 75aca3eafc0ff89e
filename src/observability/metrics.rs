//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, redirect hops, upstream errors)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `proxy_requests_total` (counter): total requests by method, status
//! - `proxy_request_duration_seconds` (histogram): time to response headers
//! - `proxy_redirect_hops` (histogram): redirects followed per exchange
//! - `proxy_upstream_errors_total` (counter): failed exchanges by error kind
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Recording without an installed recorder is a no-op (tests, embedding)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_metrics();
            tracing::info!(address = %addr, "Metrics endpoint listening");
        }
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

fn describe_metrics() {
    describe_counter!("proxy_requests_total", "Proxied requests by method and status");
    describe_histogram!(
        "proxy_request_duration_seconds",
        "Time until response headers were ready"
    );
    describe_histogram!("proxy_redirect_hops", "Redirects followed per exchange");
    describe_counter!("proxy_upstream_errors_total", "Exchanges that failed, by error kind");
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("proxy_requests_total", &labels).increment(1);
    histogram!("proxy_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_redirect_hops(hops: usize) {
    histogram!("proxy_redirect_hops").record(hops as f64);
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("proxy_upstream_errors_total", "kind" => kind).increment(1);
}
