//! Metrics collection and exposition.
//!
//! # Metrics
//! - `assembler_responses_total` (counter): outer responses by `assembled` (true/false)
//! - `assembler_fragments_total` (counter): directive resolutions by `outcome`
//! - `assembler_assembly_duration_seconds` (histogram): time spent resolving a body
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Fragment outcomes are low-cardinality labels, never references

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics recorder"),
    }
}

/// Record an outer response that bypassed assembly.
pub fn record_passthrough(reason: &'static str) {
    ::metrics::counter!("assembler_responses_total", "assembled" => "false", "reason" => reason)
        .increment(1);
}

/// Record an outer response whose body was assembled.
pub fn record_assembly(start_time: Instant) {
    ::metrics::counter!("assembler_responses_total", "assembled" => "true", "reason" => "eligible")
        .increment(1);
    ::metrics::histogram!("assembler_assembly_duration_seconds")
        .record(start_time.elapsed().as_secs_f64());
}

/// Record the outcome of a single directive.
pub fn record_fragment(outcome: &'static str) {
    ::metrics::counter!("assembler_fragments_total", "outcome" => outcome).increment(1);
}
