//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_fanout_jobs_total` (counter): startup fan-out jobs by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Unmatched requests are labelled `route="none"`

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(route: &str, status: u16, start_time: Instant) {
    counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_fanout_job(outcome: &'static str) {
    counter!("gateway_fanout_jobs_total", "outcome" => outcome).increment(1);
}
