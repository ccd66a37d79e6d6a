//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_config_reloads_total` (counter): reload attempts by outcome
//! - `gateway_route_table_generation` (gauge): generation currently serving
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::ReloadOutcome;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a reload attempt.
pub fn record_reload(outcome: &ReloadOutcome) {
    let label = match outcome {
        ReloadOutcome::Published(_) => "published",
        ReloadOutcome::Unchanged => "unchanged",
        ReloadOutcome::Rejected(_) => "rejected",
    };
    metrics::counter!("gateway_config_reloads_total", "outcome" => label).increment(1);
}

/// Record the route table generation now serving.
pub fn record_generation(generation: u64) {
    metrics::gauge!("gateway_route_table_generation").set(generation as f64);
}
