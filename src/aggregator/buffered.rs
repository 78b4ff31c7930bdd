//! Generic buffered-aggregation algorithm (spec §4.4), parameterized over a
//! [`Fold`] describing one kind's running state and merge math.

use super::PeriodicAggregator;
use crate::aggregate::Aggregate;
use crate::buffer::ValuesBuffer;
use crate::latch::ReaderWriterLatch;
use crate::period::PeriodWindow;
use crate::pool::ObjectPool;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Per-kind hook into the buffered-aggregation algorithm: how to fold a
/// flushed buffer into running state, and how to turn running state into a
/// finalized [`Aggregate`] payload.
pub trait Fold: Send + Sync + 'static {
    type Running: Default + Send;

    /// Capacity of the values buffer (spec caps this at 5000; §4.6 uses 500
    /// for Measurement).
    const BUFFER_CAPACITY: usize;
    /// Capacity of the spare-buffer pool (§4.6 uses 3).
    const SPARE_BUFFER_POOL: usize;
    /// Whether `Collect` must take the reader side of the latch (§4.4).
    const IS_COLLECT_SYNCHRONIZED: bool;

    fn can_collect(value: f64) -> bool;

    /// Folds a flushed buffer's values into `running`. Called with the
    /// aggregate-update lock held.
    fn fold_into(running: &mut Self::Running, values: &[f64]);

    fn finalize(running: &Self::Running) -> crate::aggregate::AggregatePayload;
}

/// The buffered-aggregation algorithm itself, shared by every kind that
/// needs it (today, only Measurement — see spec §9 REDESIGN FLAGS).
pub struct BufferedAggregation<K: Fold> {
    current_buffer: ArcSwap<ValuesBuffer<f64>>,
    spare_buffers: ObjectPool<ValuesBuffer<f64>>,
    latch: ReaderWriterLatch,
    running: Mutex<K::Running>,
    is_active: AtomicBool,
    period: Mutex<PeriodWindow>,
    _marker: PhantomData<K>,
}

impl<K: Fold> Default for BufferedAggregation<K> {
    fn default() -> Self {
        Self {
            current_buffer: ArcSwap::from_pointee(ValuesBuffer::new(K::BUFFER_CAPACITY)),
            spare_buffers: ObjectPool::new(K::SPARE_BUFFER_POOL),
            latch: ReaderWriterLatch::new(),
            running: Mutex::new(K::Running::default()),
            is_active: AtomicBool::new(false),
            period: Mutex::new(PeriodWindow::default()),
            _marker: PhantomData,
        }
    }
}

impl<K: Fold> BufferedAggregation<K> {
    #[must_use]
    pub fn can_collect(value: f64) -> bool {
        K::can_collect(value)
    }

    /// `Collect(v)` (spec §4.4).
    pub fn collect(&self, value: f64) -> bool {
        if K::IS_COLLECT_SYNCHRONIZED {
            let _reader = self.latch.enter_reader();
            if !self.is_active() {
                return false;
            }
        }
        self.collect_unsynchronized(value)
    }

    fn collect_unsynchronized(&self, value: f64) -> bool {
        loop {
            let buf = self.current_buffer.load_full();
            if buf.try_add(value) {
                return true;
            }
            if !self.is_active() {
                return false;
            }
            let fresh = self
                .spare_buffers
                .try_pull()
                .unwrap_or_else(|| Arc::new(ValuesBuffer::new(K::BUFFER_CAPACITY)));
            let added = fresh.try_add(value);
            debug_assert!(added, "a freshly obtained buffer must accept its first value");

            let prev = self
                .current_buffer
                .compare_and_swap(&buf, Arc::clone(&fresh));
            if Arc::ptr_eq(&prev, &buf) {
                self.flush(&buf);
                self.recycle_buffer(buf);
                return true;
            }
            self.recycle_buffer(fresh);
        }
    }

    /// Folds a buffer's values into running state. Returns whether there
    /// were any values to fold, so callers can tell a drained buffer from
    /// an already-empty one.
    fn flush(&self, buf: &ValuesBuffer<f64>) -> bool {
        let (acquired, count) = buf.try_count_values_and_lock();
        if acquired && count > 0 {
            let values = buf.values(count);
            let mut running = self.running.lock();
            K::fold_into(&mut running, values);
            true
        } else {
            false
        }
    }

    fn recycle_buffer(&self, buf: Arc<ValuesBuffer<f64>>) {
        buf.reset();
        let _ = self.spare_buffers.try_add(buf);
    }
}

impl<K: Fold> PeriodicAggregator for BufferedAggregation<K> {
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

        let _writer = self.latch.enter_writer();

        // Swap the buffer out and flush, repeating until a swap pulls back
        // an empty one. A producer that read the old buffer before this
        // call started can still be mid-rotation and install a fresh
        // buffer holding its value after our first swap; a single
        // load-and-flush would miss it and, worse, leave it attached to
        // this aggregator's `current_buffer` to be collected into the next
        // period once this instance is recycled and reused. Looping until
        // a swap observes nothing left ensures every such in-flight sample
        // is either folded in here or discarded with the buffer, never
        // carried forward (spec §4.4 step 2).
        loop {
            let drained = self
                .current_buffer
                .swap(Arc::new(ValuesBuffer::new(K::BUFFER_CAPACITY)));
            let had_values = self.flush(&drained);
            self.recycle_buffer(drained);
            if !had_values {
                break;
            }
        }

        let window = {
            let mut guard = self.period.lock();
            guard.end_ts = end_ts;
            guard.end_instant = end_instant;
            *guard
        };

        let payload = K::finalize(&self.running.lock());
        Aggregate::new(window, payload)
    }

    fn reset(&self) {
        *self.running.lock() = K::Running::default();
        // Replace rather than reuse: finish_period's drain loop can still
        // lose the race to a very last in-flight producer, so the buffer
        // this instance re-enters the spare pool with must never be
        // trusted to be empty.
        self.current_buffer
            .store(Arc::new(ValuesBuffer::new(K::BUFFER_CAPACITY)));
        self.is_active.store(false, Ordering::Release);
    }
}
