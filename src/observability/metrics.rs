//! Metrics collection and exposition.
//!
//! # Metrics
//! - `federation_rpc_calls_total` (counter): RPC calls by method, outcome
//! - `federation_transactions_total` (counter): broadcasts by outcome
//! - `federation_nonces_allocated_total` (counter): nonces handed out
//! - `federation_node_up` (gauge): 1=node answered liveness probe, 0=not
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is opt-in and installed by the binary only

use std::net::SocketAddr;

/// Install the Prometheus exporter with an HTTP scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of a single RPC call.
pub fn record_rpc_call(method: &'static str, outcome: &'static str) {
    ::metrics::counter!("federation_rpc_calls_total", "method" => method, "outcome" => outcome)
        .increment(1);
}

/// Record a broadcast attempt (`accepted` or `rejected`).
pub fn record_transaction(outcome: &'static str) {
    ::metrics::counter!("federation_transactions_total", "outcome" => outcome).increment(1);
}

pub fn record_nonce_allocated() {
    ::metrics::counter!("federation_nonces_allocated_total").increment(1);
}

/// Record node liveness as observed by the connection probe.
pub fn record_node_health(healthy: bool) {
    ::metrics::gauge!("federation_node_up").set(if healthy { 1.0 } else { 0.0 });
}
