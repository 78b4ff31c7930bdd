//! Count aggregation (spec §4.5): a single atomic sum, no buffer.

use super::PeriodicAggregator;
use crate::aggregate::{Aggregate, AggregatePayload};
use crate::period::PeriodWindow;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Accepts integer samples, or doubles with no fractional part; rejects
/// everything else by returning `false` (spec §4.5, §8 integrality
/// property).
pub struct CountAggregator {
    sum: AtomicI64,
    is_active: AtomicBool,
    period: Mutex<PeriodWindow>,
}

impl Default for CountAggregator {
    fn default() -> Self {
        Self {
            sum: AtomicI64::new(0),
            is_active: AtomicBool::new(false),
            period: Mutex::new(PeriodWindow::default()),
        }
    }
}

impl CountAggregator {
    #[must_use]
    pub fn can_collect(value: f64) -> bool {
        value.is_finite() && value.fract() == 0.0
    }

    /// `Collect(double)`: rejects non-integral values without touching
    /// state (spec §8: `Collect(3.5)` must not modify the running sum).
    pub fn collect_f64(&self, value: f64) -> bool {
        if !Self::can_collect(value) {
            return false;
        }
        #[allow(clippy::cast_possible_truncation)]
        self.collect_i64(value as i64)
    }

    /// `Collect(int)`: always integral, so the only rejection reason is an
    /// already-finished period.
    pub fn collect_i64(&self, value: i64) -> bool {
        if !self.is_active() {
            return false;
        }
        self.sum.fetch_add(value, Ordering::AcqRel);
        true
    }
}

impl PeriodicAggregator for CountAggregator {
    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Acquire)
    }

    fn start_period(&self, start_ts: DateTime<Utc>, start_instant: Instant) {
        *self.period.lock() = PeriodWindow {
            start_ts,
            end_ts: start_ts,
            start_instant,
            end_instant: start_instant,
        };
        self.is_active.store(true, Ordering::Release);
    }

    fn finish_period(self: &Arc<Self>, end_ts: DateTime<Utc>, end_instant: Instant) -> Aggregate {
        self.is_active.store(false, Ordering::Release);
        let window = {
            let mut guard = self.period.lock();
            guard.end_ts = end_ts;
            guard.end_instant = end_instant;
            *guard
        };
        let sum = self.sum.swap(0, Ordering::AcqRel);
        Aggregate::new(window, AggregatePayload::Count { sum })
    }

    fn reset(&self) {
        self.sum.store(0, Ordering::Release);
        self.is_active.store(false, Ordering::Release);
    }
}
