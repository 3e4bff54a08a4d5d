//! Metrics collection and exposition.
//!
//! # Metrics
//! - `circuit_guard_calls_total` (counter): calls by breaker, outcome (success, failure, rejected)
//! - `circuit_guard_rejections_total` (counter): rejections by breaker, reason
//! - `circuit_guard_transitions_total` (counter): phase changes by breaker, from, to
//! - `circuit_guard_phase` (gauge): 0=closed, 1=open, 2=half_open
//! - `circuit_guard_unexpected_success_total` (counter): success reported while open
//!
//! # Design Decisions
//! - Low-overhead metric updates through the global `metrics` recorder
//! - Labels are the breaker name plus one bounded dimension

use std::net::SocketAddr;
use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::breaker::{Phase, RejectReason};

static DESCRIBED: OnceLock<()> = OnceLock::new();

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe_metrics();
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

fn describe_metrics() {
    DESCRIBED.get_or_init(|| {
        describe_counter!("circuit_guard_calls_total", "Guarded calls by outcome");
        describe_counter!(
            "circuit_guard_rejections_total",
            "Calls short-circuited by a breaker"
        );
        describe_counter!(
            "circuit_guard_transitions_total",
            "Breaker phase transitions"
        );
        describe_gauge!(
            "circuit_guard_phase",
            "Current breaker phase (0=closed, 1=open, 2=half_open)"
        );
        describe_counter!(
            "circuit_guard_unexpected_success_total",
            "Successes reported while the breaker was open"
        );
    });
}

/// Record the outcome of one guarded call.
pub fn record_call(breaker: &str, outcome: &'static str) {
    counter!(
        "circuit_guard_calls_total",
        "breaker" => breaker.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a rejected call.
pub fn record_rejection(breaker: &str, reason: RejectReason) {
    record_call(breaker, "rejected");
    counter!(
        "circuit_guard_rejections_total",
        "breaker" => breaker.to_string(),
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// Record a phase change and update the phase gauge.
pub fn record_transition(breaker: &str, from: Phase, to: Phase) {
    counter!(
        "circuit_guard_transitions_total",
        "breaker" => breaker.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    record_phase(breaker, to);
}

/// Set the phase gauge.
pub fn record_phase(breaker: &str, phase: Phase) {
    gauge!("circuit_guard_phase", "breaker" => breaker.to_string()).set(phase as u8 as f64);
}

pub fn record_unexpected_success(breaker: &str) {
    counter!(
        "circuit_guard_unexpected_success_total",
        "breaker" => breaker.to_string()
    )
    .increment(1);
}
