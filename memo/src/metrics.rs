//! Metrics declaration and recording.
//!
//! Every metric carries a `memo` label with the name given to the memo at
//! build time. When the `metrics` feature is disabled the recording
//! functions are no-ops and will be eliminated by the compiler.

use std::time::Duration;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of lookups accepted by the owner.
    pub static ref MEMO_REQUESTS: &'static str = {
        metrics::describe_counter!(
            "memo_requests_total",
            "Total number of lookups dispatched by the memo owner."
        );
        "memo_requests_total"
    };
    /// Track number of lookups refused because the memo was closed.
    pub static ref MEMO_REJECTED: &'static str = {
        metrics::describe_counter!(
            "memo_rejected_total",
            "Total number of lookups refused after shutdown."
        );
        "memo_rejected_total"
    };
    /// Track number of computations run.
    pub static ref MEMO_COMPUTATIONS: &'static str = {
        metrics::describe_counter!(
            "memo_computations_total",
            "Total number of computations run, one per distinct key."
        );
        "memo_computations_total"
    };
    /// Track number of computations that failed or panicked.
    pub static ref MEMO_COMPUTATION_ERRORS: &'static str = {
        metrics::describe_counter!(
            "memo_computation_errors_total",
            "Total number of computations that failed or panicked."
        );
        "memo_computation_errors_total"
    };
    /// Track number of results handed to requesters.
    pub static ref MEMO_DELIVERIES: &'static str = {
        metrics::describe_counter!(
            "memo_deliveries_total",
            "Total number of results delivered to requesters."
        );
        "memo_deliveries_total"
    };
    /// Gauge of entries held by the memo.
    pub static ref MEMO_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "memo_entries",
            "Number of entries held by the memo."
        );
        "memo_entries"
    };
    /// Histogram of computation duration.
    pub static ref MEMO_COMPUTATION_DURATION: &'static str = {
        metrics::describe_histogram!(
            "memo_computation_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of computations in seconds."
        );
        "memo_computation_duration_seconds"
    };
}

/// Record a lookup dispatched by the owner.
#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_request(name: &str) {
    metrics::counter!(*MEMO_REQUESTS, "memo" => name.to_string()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_request(_name: &str) {}

/// Record a lookup refused after shutdown.
#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_rejected(name: &str) {
    metrics::counter!(*MEMO_REJECTED, "memo" => name.to_string()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_rejected(_name: &str) {}

/// Record a newly created entry; `entries` is the table size afterwards.
#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_entry_created(name: &str, entries: usize) {
    metrics::counter!(*MEMO_COMPUTATIONS, "memo" => name.to_string()).increment(1);
    metrics::gauge!(*MEMO_ENTRIES, "memo" => name.to_string()).set(entries as f64);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_entry_created(_name: &str, _entries: usize) {}

/// Record a finished computation.
#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_computation(name: &str, duration: Duration, failed: bool) {
    metrics::histogram!(*MEMO_COMPUTATION_DURATION, "memo" => name.to_string())
        .record(duration.as_secs_f64());
    if failed {
        metrics::counter!(*MEMO_COMPUTATION_ERRORS, "memo" => name.to_string()).increment(1);
    }
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_computation(_name: &str, _duration: Duration, _failed: bool) {}

/// Record a result delivered to a requester.
#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_delivery(name: &str) {
    metrics::counter!(*MEMO_DELIVERIES, "memo" => name.to_string()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_delivery(_name: &str) {}
