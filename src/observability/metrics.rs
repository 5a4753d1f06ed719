//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lxd_provider_discovery_cycles_total` (counter): listings by `outcome`
//! - `lxd_provider_backoff_total` (counter): transitions into backoff
//! - `lxd_provider_snapshot_instances` (gauge): instances in the last snapshot
//! - `lxd_provider_decode_errors_total` (counter): instances skipped for bad labels
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is installed only when enabled in config

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one discovery cycle.
pub fn record_cycle(outcome: &'static str, elapsed: Duration) {
    counter!("lxd_provider_discovery_cycles_total", "outcome" => outcome).increment(1);
    histogram!("lxd_provider_discovery_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record a transition into backoff.
pub fn record_backoff(delay: Duration) {
    counter!("lxd_provider_backoff_total").increment(1);
    gauge!("lxd_provider_backoff_delay_seconds").set(delay.as_secs_f64());
}

/// Record the size of a published snapshot.
pub fn record_snapshot(instances: usize) {
    gauge!("lxd_provider_snapshot_instances").set(instances as f64);
    gauge!("lxd_provider_backoff_delay_seconds").set(0.0);
}

/// Record an instance skipped because of invalid labels.
pub fn record_decode_error() {
    counter!("lxd_provider_decode_errors_total").increment(1);
}
