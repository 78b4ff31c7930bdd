//! Many-reader / single-writer latch used to gate buffer flushes against
//! period-boundary finalization (spec §4.2).
//!
//! Reader entry is a single interlocked increment; the writer blocks behind
//! a `parking_lot::Mutex` that is only actually contended when a writer is
//! present. In the common `is_collect_synchronized = false` mode readers
//! never call this type at all — it exists purely for the
//! `is_collect_synchronized = true` path and for the writer-side drain in
//! `FinishAggregationPeriod`.

use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A many-reader / single-writer coordinator.
///
/// Unlike `std::sync::RwLock`, readers here don't block each other at all —
/// entry is one `fetch_add`. The writer acquires an actual mutex, so it
/// mutually excludes *other writers* and, via [`ReaderGuard`]'s drop path
/// toggling the reader count, excludes readers for the duration it holds
/// the write guard.
pub struct ReaderWriterLatch {
    readers: AtomicUsize,
    write_gate: Mutex<()>,
}

/// RAII guard held by a reader for the duration of its critical section.
pub struct ReaderGuard<'a> {
    latch: &'a ReaderWriterLatch,
}

/// RAII guard held by the writer; readers that enter while this is alive
/// will still increment the reader counter (readers are never blocked by
/// the latch itself) — callers that need true mutual exclusion pair this
/// latch with the `_update_aggregate_lock`-style critical section described
/// in spec §4.4, which this crate models as a `parking_lot::Mutex` around
/// the aggregator's running state.
pub struct WriterGuard<'a> {
    _write_gate: MutexGuard<'a, ()>,
    latch: &'a ReaderWriterLatch,
}

impl Default for ReaderWriterLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderWriterLatch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            readers: AtomicUsize::new(0),
            write_gate: Mutex::new(()),
        }
    }

    /// Enters the reader side. Cheap: one interlocked increment, no
    /// blocking — this is the `is_collect_synchronized = true` path's
    /// per-sample cost.
    pub fn enter_reader(&self) -> ReaderGuard<'_> {
        self.readers.fetch_add(1, Ordering::AcqRel);
        ReaderGuard { latch: self }
    }

    /// Acquires the writer side, blocking until no writer currently holds
    /// it. Used once per period, at finalization.
    pub fn enter_writer(&self) -> WriterGuard<'_> {
        let guard = self.write_gate.lock();
        WriterGuard {
            _write_gate: guard,
            latch: self,
        }
    }

    /// Number of readers currently inside their critical section.
    pub fn reader_count(&self) -> usize {
        self.readers.load(Ordering::Acquire)
    }
}

impl Drop for ReaderGuard<'_> {
    fn drop(&mut self) {
        self.latch.readers.fetch_sub(1, Ordering::AcqRel);
    }
}
