//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define control plane metrics (requests, publishes, previews)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `uicp_requests_total` (counter): requests by route, method, status
//! - `uicp_request_duration_seconds` (histogram): latency by route
//! - `uicp_publishes_total` (counter): publish attempts by environment, outcome
//! - `uicp_rollbacks_total` (counter): rollback attempts by environment, outcome
//! - `uicp_preview_sessions_issued_total` (counter)
//! - `uicp_preview_resolutions_total` (counter): by outcome
//! - `uicp_preview_sessions_active` (gauge): tracked sessions
//! - `uicp_documents_total` (gauge): stored versions
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library code
//!   and tests can call these freely
//! - Outcome labels reuse the API error codes

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe();
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

fn describe() {
    describe_counter!("uicp_requests_total", "HTTP requests served");
    describe_histogram!("uicp_request_duration_seconds", "HTTP request latency");
    describe_counter!("uicp_publishes_total", "Publish attempts");
    describe_counter!("uicp_rollbacks_total", "Rollback attempts");
    describe_counter!("uicp_preview_sessions_issued_total", "Preview codes issued");
    describe_counter!("uicp_preview_resolutions_total", "Preview code lookups");
    describe_gauge!("uicp_preview_sessions_active", "Tracked preview sessions");
    describe_gauge!("uicp_documents_total", "Stored document versions");
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "uicp_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("uicp_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_publish(environment: &str, outcome: &'static str) {
    counter!(
        "uicp_publishes_total",
        "environment" => environment.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_rollback(environment: &str, outcome: &'static str) {
    counter!(
        "uicp_rollbacks_total",
        "environment" => environment.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_preview_issued() {
    counter!("uicp_preview_sessions_issued_total").increment(1);
}

pub fn record_preview_resolution(outcome: &'static str) {
    counter!("uicp_preview_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_active_previews(count: usize) {
    gauge!("uicp_preview_sessions_active").set(count as f64);
}

pub fn record_documents(count: usize) {
    gauge!("uicp_documents_total").set(count as f64);
}
