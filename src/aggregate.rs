//! The finalized, immutable-after-construction per-period result (spec §3, §6).

use crate::period::PeriodWindow;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Kind-specific numeric payload of an [`Aggregate`].
///
/// A closed sum type mirroring `MetricKind`: the sink matches on this to
/// decide how to serialize a period's result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregatePayload {
    Count { sum: i64 },
    Measurement {
        count: i32,
        sum: f64,
        min: f64,
        max: f64,
        std_dev: f64,
    },
}

/// A finalized snapshot of one metric's aggregation period, handed to the
/// submission sink.
///
/// Holds no back-reference to its owning aggregator. `Aggregate` is a small,
/// otherwise ordinary value type with no buffers or atomics inside it, so
/// pooling it buys nothing here that pooling aggregators and values buffers
/// doesn't already buy; see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub period_start_timestamp: DateTime<Utc>,
    pub period_end_timestamp: DateTime<Utc>,
    pub period_start_precise: Instant,
    pub period_end_precise: Instant,
    pub payload: AggregatePayload,
}

impl Aggregate {
    pub(crate) fn new(window: PeriodWindow, payload: AggregatePayload) -> Self {
        Self {
            period_start_timestamp: window.start_ts,
            period_end_timestamp: window.end_ts,
            period_start_precise: window.start_instant,
            period_end_precise: window.end_instant,
            payload,
        }
    }

    /// Exact period duration from the monotonic timestamps (valid regardless
    /// of wall-clock rounding or adjustment).
    #[must_use]
    pub fn finished_duration(&self) -> Duration {
        self.period_end_precise
            .saturating_duration_since(self.period_start_precise)
    }

    /// Required by the submission sink contract: called exactly once per
    /// aggregate after the sink no longer needs it.
    ///
    /// No pool to return to — see the type-level note above. This exists so
    /// sink implementations written against the pooled-runtime contract
    /// still compile and behave correctly.
    pub fn reinitialize_and_return_to_owner(self) {
        drop(self);
    }
}
