//! Metrics collection and exposition.
//!
//! # Metrics
//! - `watcher_records_total` (counter): parsed log records
//! - `watcher_malformed_lines_total` (counter): lines the parser rejected
//! - `watcher_window_error_rate` (gauge): live error percentage
//! - `watcher_degraded` (gauge): 1=degraded, 0=normal
//! - `watcher_pool_changes_total` (counter): by kind (failover, recovery)
//! - `watcher_alerts_total` (counter): by kind and dispatch outcome
//! - `watcher_notifications_total` (counter): by delivery outcome
//! - `watcher_log_reopens_total` (counter): by reason (truncated, rotated, missing)
//!
//! Without an installed exporter every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::detection::MonitorEvent;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_line() {
    metrics::counter!("watcher_records_total").increment(1);
}

pub fn record_malformed() {
    metrics::counter!("watcher_malformed_lines_total").increment(1);
}

pub fn record_window(error_rate: f64, degraded: bool) {
    metrics::gauge!("watcher_window_error_rate").set(error_rate);
    metrics::gauge!("watcher_degraded").set(if degraded { 1.0 } else { 0.0 });
}

pub fn record_event(event: &MonitorEvent) {
    let kind = match event {
        MonitorEvent::Failover { .. } => "failover",
        MonitorEvent::PoolRecovered { .. } => "recovery",
        MonitorEvent::HighErrorRate(_) | MonitorEvent::ErrorRateRecovered(_) => return,
    };
    metrics::counter!("watcher_pool_changes_total", "kind" => kind).increment(1);
}

pub fn record_alert(kind: &'static str, outcome: &'static str) {
    metrics::counter!("watcher_alerts_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_notification(sent: bool) {
    let outcome = if sent { "sent" } else { "failed" };
    metrics::counter!("watcher_notifications_total", "outcome" => outcome).increment(1);
}

pub fn record_reopen(reason: &'static str) {
    metrics::counter!("watcher_log_reopens_total", "reason" => reason).increment(1);
}
