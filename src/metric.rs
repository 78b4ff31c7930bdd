//! `Metric` and the closed `MetricKind` variant set (spec §3, §4.7).

use crate::aggregate::Aggregate;
use crate::aggregator::{AggregatorSlot, BufferedAggregation, CountAggregator, MeasurementFold};
use crate::identity::MetricIdentity;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A sample value offered to `Metric::collect`. Producers may supply either
/// an integer or a floating-point value (spec §6: `Collect(double | int)`).
#[derive(Debug, Clone, Copy)]
pub enum Sample {
    Int(i64),
    Float(f64),
}

impl From<i64> for Sample {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}
impl From<i32> for Sample {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}
impl From<f64> for Sample {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl Sample {
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => {
                #[allow(clippy::cast_precision_loss)]
                let v = v as f64;
                v
            }
            Self::Float(v) => v,
        }
    }
}

/// The closed set of aggregation kinds (spec §3, §9: tagged sum, not an
/// open-ended trait-object registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Count,
    Measurement,
}

enum MetricState {
    Count(AggregatorSlot<CountAggregator>),
    Measurement(AggregatorSlot<BufferedAggregation<MeasurementFold>>),
}

/// Owns exactly one current aggregator plus a bounded spare-aggregator pool
/// (spec §3: capacity 3), and at most one collection-manager attachment.
pub struct Metric {
    identity: MetricIdentity,
    kind: MetricKind,
    state: MetricState,
    /// `0` means unattached; otherwise the attached manager's unique id
    /// (spec §9: back-reference modeled as an id claim, not a literal
    /// back-pointer, to avoid a reference cycle through the registry).
    manager_id: AtomicU64,
}

/// Capacity of each metric's spare-aggregator pool (spec §3).
const SPARE_AGGREGATOR_POOL: usize = 3;

impl Metric {
    #[must_use]
    pub fn new(identity: MetricIdentity, kind: MetricKind) -> Arc<Self> {
        let state = match kind {
            MetricKind::Count => MetricState::Count(AggregatorSlot::new(SPARE_AGGREGATOR_POOL)),
            MetricKind::Measurement => {
                MetricState::Measurement(AggregatorSlot::new(SPARE_AGGREGATOR_POOL))
            }
        };
        Arc::new(Self {
            identity,
            kind,
            state,
            manager_id: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }

    #[must_use]
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Fast pre-check mirroring `Collect`'s acceptance rule without
    /// submitting a sample (spec §4.7 `CanCollect`).
    #[must_use]
    pub fn can_collect(&self, value: Sample) -> bool {
        match &self.state {
            MetricState::Count(_) => CountAggregator::can_collect(value.as_f64()),
            MetricState::Measurement(_) => true,
        }
    }

    /// `Metric.Collect(value) -> bool` (spec §6).
    pub fn collect(&self, value: impl Into<Sample>) -> bool {
        match (&self.state, value.into()) {
            (MetricState::Count(slot), Sample::Int(v)) => slot.load().collect_i64(v),
            (MetricState::Count(slot), Sample::Float(v)) => slot.load().collect_f64(v),
            (MetricState::Measurement(slot), sample) => slot.load().collect(sample.as_f64()),
        }
    }

    /// Claims attachment to `manager_id`. Fails if already attached to a
    /// different manager (spec §4.7, §7 `MisuseError`).
    pub(crate) fn try_attach(&self, manager_id: u64) -> bool {
        self.manager_id
            .compare_exchange(0, manager_id, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            || self.manager_id.load(Ordering::Acquire) == manager_id
    }

    pub(crate) fn try_detach(&self, manager_id: u64) -> bool {
        self.manager_id
            .compare_exchange(manager_id, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `StartNextAggregationPeriod` (spec §4.4 step 3): swap in a fresh
    /// aggregator and return the outgoing one, opaquely boxed so the
    /// manager can hold a homogeneous block regardless of kind.
    pub(crate) fn start_next_period(
        &self,
        start_ts: DateTime<Utc>,
        start_instant: Instant,
    ) -> PendingFinish {
        match &self.state {
            MetricState::Count(slot) => {
                PendingFinish::Count(slot.start_next_period(start_ts, start_instant))
            }
            MetricState::Measurement(slot) => {
                PendingFinish::Measurement(slot.start_next_period(start_ts, start_instant))
            }
        }
    }

    /// `FinishAggregationPeriod` (spec §4.4) plus recycling the outgoing
    /// aggregator back into this metric's spare pool.
    pub(crate) fn finish_and_recycle(
        &self,
        pending: PendingFinish,
        end_ts: DateTime<Utc>,
        end_instant: Instant,
    ) -> Aggregate {
        match (&self.state, pending) {
            (MetricState::Count(slot), PendingFinish::Count(prev)) => {
                let aggregate = prev.finish_period(end_ts, end_instant);
                slot.recycle(prev);
                aggregate
            }
            (MetricState::Measurement(slot), PendingFinish::Measurement(prev)) => {
                let aggregate = prev.finish_period(end_ts, end_instant);
                slot.recycle(prev);
                aggregate
            }
            _ => unreachable!("PendingFinish kind always matches its originating Metric"),
        }
    }
}

/// The outgoing aggregator captured at `StartNextAggregationPeriod`, carried
/// until `FinishAggregationPeriod` is invoked on it (spec §4.8 steps 4–5).
pub(crate) enum PendingFinish {
    Count(Arc<CountAggregator>),
    Measurement(Arc<BufferedAggregation<MeasurementFold>>),
}
