//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define fleet metrics (control calls, gate decisions, pending clients, idle stops)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `fleet_control_actions_total` (counter): control requests by action, result
//! - `fleet_gate_decisions_total` (counter): gate outcomes by decision
//! - `fleet_pending_clients` (gauge): waiting clients per backend
//! - `fleet_backend_online` (gauge): 1=online, 0=offline, per probe
//! - `fleet_idle_stops_total` (counter): idle stops by backend, result
//! - `fleet_pending_delivered_total` (counter): clients delivered after startup
//!
//! # Design Decisions
//! - Recording functions are no-ops until a recorder is installed
//! - Backend ids are the only high-cardinality label

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::control::ControlAction;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_control_action(action: ControlAction, result: &'static str) {
    metrics::counter!(
        "fleet_control_actions_total",
        "action" => action.as_str(),
        "result" => result
    )
    .increment(1);
}

pub fn record_gate_decision(decision: &'static str) {
    metrics::counter!("fleet_gate_decisions_total", "decision" => decision).increment(1);
}

pub fn record_pending(backend: &str, waiting: usize) {
    metrics::gauge!("fleet_pending_clients", "backend" => backend.to_string()).set(waiting as f64);
}

pub fn record_pending_delivered(backend: &str, delivered: usize) {
    metrics::counter!("fleet_pending_delivered_total", "backend" => backend.to_string())
        .increment(delivered as u64);
}

pub fn record_backend_online(backend: &str, online: bool) {
    let value = if online { 1.0 } else { 0.0 };
    metrics::gauge!("fleet_backend_online", "backend" => backend.to_string()).set(value);
}

pub fn record_idle_stop(backend: &str, result: &'static str) {
    metrics::counter!(
        "fleet_idle_stops_total",
        "backend" => backend.to_string(),
        "result" => result
    )
    .increment(1);
}
