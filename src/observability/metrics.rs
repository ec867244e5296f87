//! Metrics collection and exposition.
//!
//! # Metrics
//! - `chain_connect_connection_events_total` (counter): connection events by `event`
//! - `chain_connect_bootstrap_failures_total` (counter): failed ChainReady loads
//! - `chain_connect_api_ready` (gauge): 1 once a ChainReady load has been published
//! - `chain_connect_bootstrap_duration_seconds` (histogram): ChainReady load time

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics exporter"),
    }
}

pub fn record_connection_event(event: &'static str) {
    metrics::counter!("chain_connect_connection_events_total", "event" => event).increment(1);
}

pub fn record_bootstrap_success(duration: Duration) {
    metrics::histogram!("chain_connect_bootstrap_duration_seconds").record(duration.as_secs_f64());
    metrics::gauge!("chain_connect_api_ready").set(1.0);
}

pub fn record_bootstrap_failure() {
    metrics::counter!("chain_connect_bootstrap_failures_total").increment(1);
}
