//! Metrics instrumentation for clusterset-dns.
//!
//! All metrics are prefixed with `clusterset_dns.`

use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Record a served DNS query.
pub fn record_query(qtype: &str, outcome: QueryOutcome, duration: std::time::Duration) {
    let outcome_str = match outcome {
        QueryOutcome::Success => "success",
        QueryOutcome::NoData => "nodata",
        QueryOutcome::NxDomain => "nxdomain",
        QueryOutcome::NotZone => "notzone",
        QueryOutcome::Fallthrough => "fallthrough",
        QueryOutcome::ServFail => "servfail",
    };

    counter!("clusterset_dns.query.count", "qtype" => qtype.to_string(), "outcome" => outcome_str)
        .increment(1);
    histogram!("clusterset_dns.query.duration.seconds", "qtype" => qtype.to_string())
        .record(duration.as_secs_f64());
}

/// Query outcome for metrics.
#[derive(Debug, Clone, Copy)]
pub enum QueryOutcome {
    /// Answered with at least one record.
    Success,
    /// Name exists, no records for the current state or qtype.
    NoData,
    /// Service (or name) unknown.
    NxDomain,
    /// Name outside every served zone.
    NotZone,
    /// Delegated to the next handler.
    Fallthrough,
    /// Could not answer (write failure, missing downstream).
    ServFail,
}

/// Record how many answers a successful response carried.
pub fn record_answers_returned(count: usize) {
    histogram!("clusterset_dns.query.answers_returned").record(count as f64);
}

/// Record store sizes (call periodically or on change).
pub fn record_store_counts(services: usize, endpoint_slices: usize, local_services: usize) {
    gauge!("clusterset_dns.state.services.count").set(services as f64);
    gauge!("clusterset_dns.state.endpoint_slices.count").set(endpoint_slices as f64);
    gauge!("clusterset_dns.state.local_services.count").set(local_services as f64);
}

/// Helper for timing operations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed duration since the timer started.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
