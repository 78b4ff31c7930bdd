//! Fixed-capacity lock-free append buffer (spec §4.3).
//!
//! Producers pay a single `fetch_add` per `try_add`. Once
//! `try_count_values_and_lock` has returned successfully the buffer accepts
//! no further appends; `reset` clears it for reuse from the spare-buffer
//! pool.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Maximum buffer capacity (spec §3: `C <= 5000`).
pub const MAX_CAPACITY: usize = 5000;

/// A fixed-capacity, append-only buffer of `T`.
///
/// `T` must be `Copy` — values are sampled numerics (`f64`), never stored by
/// reference, so there is no aliasing hazard in reading through
/// `UnsafeCell` slots once `try_count_values_and_lock` has established that
/// no producer can still be writing to them (see the safety note on
/// [`ValuesBuffer::values`]).
pub struct ValuesBuffer<T> {
    values: Box<[UnsafeCell<T>]>,
    prev_add_index: AtomicI64,
    is_locked: AtomicBool,
}

// SAFETY: access to `values` slots is only ever performed either by the
// single producer that won the slot (via `try_add`, which never revisits an
// index) or, after `try_count_values_and_lock` has returned `true`, by the
// single thread that called it — at that point `prev_add_index` is pinned
// at `capacity` and no producer can still be mid-write to an index below
// `count`, because each producer's `try_add` only touches the exact index
// it claimed before it observed success.
unsafe impl<T: Send> Send for ValuesBuffer<T> {}
unsafe impl<T: Send> Sync for ValuesBuffer<T> {}

impl<T: Copy + Default> ValuesBuffer<T> {
    /// Creates an empty buffer of the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is `0` or exceeds [`MAX_CAPACITY`].
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity > 0 && capacity <= MAX_CAPACITY,
            "values buffer capacity must be in 1..={MAX_CAPACITY}, got {capacity}"
        );
        let values = (0..capacity)
            .map(|_| UnsafeCell::new(T::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            values,
            prev_add_index: AtomicI64::new(-1),
            is_locked: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Attempts to append `value`. Returns `true` if a slot was claimed.
    ///
    /// Once the buffer is full, `prev_add_index` is clamped at `capacity` —
    /// producers never spin here; a `false` return means "go get a fresh
    /// buffer", handled one level up by the buffered aggregator.
    pub fn try_add(&self, value: T) -> bool {
        let idx = self.prev_add_index.fetch_add(1, Ordering::AcqRel) + 1;
        let capacity = self.values.len() as i64;
        if idx < capacity {
            // SAFETY: this index was claimed by exactly this call via the
            // fetch_add above; no other caller can claim the same index.
            unsafe {
                *self.values[idx as usize].get() = value;
            }
            true
        } else {
            // Clamp so repeated failed attempts under sustained contention
            // cannot overflow the counter.
            self.prev_add_index.store(capacity, Ordering::Release);
            false
        }
    }

    /// Locks the buffer against further appends and returns the number of
    /// values present. Returns `false` (count `0`) if the buffer was
    /// already locked — this is meant to succeed at most once per buffer
    /// lifetime before `reset`.
    pub fn try_count_values_and_lock(&self) -> (bool, usize) {
        if self.is_locked.swap(true, Ordering::AcqRel) {
            return (false, 0);
        }
        let capacity = self.values.len() as i64;
        let prev = self.prev_add_index.swap(capacity, Ordering::AcqRel);
        let count = (prev + 1).clamp(0, capacity) as usize;
        (true, count)
    }

    /// Reads the values accumulated so far (up to `count`, from a prior
    /// `try_count_values_and_lock`).
    ///
    /// # Safety
    ///
    /// Must only be called after `try_count_values_and_lock` returned
    /// `true` for this buffer (and before the next `reset`), and `count`
    /// must be the value it returned.
    pub fn values(&self, count: usize) -> &[T] {
        debug_assert!(count <= self.values.len());
        let ptr = self.values.as_ptr().cast::<T>();
        // SAFETY: see the type-level safety note — once locked, no writer
        // can still be racing on indices < count.
        unsafe { std::slice::from_raw_parts(ptr, count) }
    }

    /// Clears the buffer for reuse. No producer can observe a half-reset
    /// buffer: the index is pinned at capacity for the duration of the
    /// zero-fill, then released last.
    pub fn reset(&self) {
        self.is_locked.store(true, Ordering::Release);
        let capacity = self.values.len() as i64;
        self.prev_add_index.store(capacity, Ordering::Release);
        for cell in self.values.iter() {
            // SAFETY: prev_add_index is pinned at capacity, so no `try_add`
            // can be mid-write to any slot while we zero it.
            unsafe {
                *cell.get() = T::default();
            }
        }
        self.prev_add_index.store(0, Ordering::Release);
        self.is_locked.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked.load(Ordering::Acquire)
    }
}
