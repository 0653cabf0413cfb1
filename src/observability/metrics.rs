//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define coordinator metrics (requests, latency, envelopes, simulations)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `grant_requests_total` (counter): requests by operation, status
//! - `grant_request_duration_seconds` (histogram): latency by operation
//! - `grant_envelopes_built_total` (counter): envelopes by function, intent
//! - `grant_simulations_total` (counter): simulations by function, outcome
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels are low-cardinality: operation and function names only

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::soroban::Intent;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled API request.
pub fn record_request(operation: &'static str, status: u16, start: Instant) {
    counter!(
        "grant_requests_total",
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("grant_request_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_envelope_built(function: &str, intent: Intent) {
    counter!(
        "grant_envelopes_built_total",
        "function" => function.to_string(),
        "intent" => intent.as_str()
    )
    .increment(1);
}

/// `outcome` is one of `success`, `rejected`, `network_error`.
pub fn record_simulation(function: &'static str, outcome: &'static str) {
    counter!(
        "grant_simulations_total",
        "function" => function,
        "outcome" => outcome
    )
    .increment(1);
}
