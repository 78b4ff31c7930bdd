//! Per-metric aggregator state machine (spec §4.4–§4.6).
//!
//! Each kind implements [`PeriodicAggregator`] directly rather than
//! inheriting from a shared base: a capability trait both concrete kinds
//! implement directly, plus [`AggregatorSlot`], a generic helper that owns
//! the current/spare rotation logic common to both (spec §9 REDESIGN FLAGS).

mod buffered;
mod count;
mod measurement;

pub use buffered::{BufferedAggregation, Fold};
pub use count::CountAggregator;
pub use measurement::{MeasurementFold, MeasurementRunning};

use crate::aggregate::Aggregate;
use crate::pool::ObjectPool;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Capability interface every concrete aggregator kind implements.
///
/// Covers period start/finish and pool recycling (spec §4.4).
pub trait PeriodicAggregator: Send + Sync + Default {
    /// Whether the aggregator is currently accepting samples.
    fn is_active(&self) -> bool;

    /// Begins a new aggregation period.
    fn start_period(&self, start_ts: DateTime<Utc>, start_instant: Instant);

    /// Ends the current period and returns the finalized aggregate. Must be
    /// called through an `Arc` because finalization may need to hand out a
    /// weak reference to `self` (it does not today, but the seam is kept
    /// for that case — see DESIGN.md).
    fn finish_period(self: &Arc<Self>, end_ts: DateTime<Utc>, end_instant: Instant) -> Aggregate;

    /// Zeroes running state before the aggregator is returned to a spare
    /// pool. Callers must only call this on an aggregator that is already
    /// inactive (spec §9 Open Question on pool recycling).
    fn reset(&self);
}

/// Owns the current/spare rotation for one [`PeriodicAggregator`] kind
/// within a `Metric`.
///
/// This is the "reusable helper struct" called for in spec §9: both
/// `CountAggregator` and `BufferedAggregation<MeasurementFold>` plug into
/// the same rotation logic.
pub(crate) struct AggregatorSlot<A: PeriodicAggregator> {
    current: ArcSwap<A>,
    spares: ObjectPool<A>,
}

impl<A: PeriodicAggregator> AggregatorSlot<A> {
    pub(crate) fn new(spare_capacity: usize) -> Self {
        Self {
            current: ArcSwap::from_pointee(A::default()),
            spares: ObjectPool::new(spare_capacity),
        }
    }

    pub(crate) fn load(&self) -> Arc<A> {
        self.current.load_full()
    }

    /// Swaps in a fresh (or recycled) aggregator and returns the outgoing
    /// one (spec §4.4 `StartNextAggregationPeriod`).
    pub(crate) fn start_next_period(
        &self,
        start_ts: DateTime<Utc>,
        start_instant: Instant,
    ) -> Arc<A> {
        let fresh = self
            .spares
            .try_pull()
            .unwrap_or_else(|| Arc::new(A::default()));
        fresh.start_period(start_ts, start_instant);
        self.current.swap(fresh)
    }

    /// Returns a finished aggregator to the spare pool after zeroing it.
    pub(crate) fn recycle(&self, prev: Arc<A>) {
        prev.reset();
        let _ = self.spares.try_add(prev);
    }
}
