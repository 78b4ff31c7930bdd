//! Bounded lock-free object pool (spec §4.1).
//!
//! A fixed-capacity array of slots, each a `Option<T>` behind
//! `arc_swap::ArcSwapOption`. `try_add`/`try_pull` scan linearly and claim a
//! slot with a single compare-and-swap (or swap), so both are wait-free up
//! to `capacity` steps and lock-free under contention. Either call may
//! report "full"/"empty" spuriously when another thread wins a race for the
//! same slot; callers treat that as "fall back to allocation", exactly as
//! the design calls for.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Recycles instances of `T` across period boundaries.
///
/// Capacity is bounded at construction to `1..=10_000`, mostly to bound
/// memory under a misconfigured caller rather than to dodge any
/// runtime-specific allocation boundary.
pub struct ObjectPool<T> {
    slots: Box<[ArcSwapOption<T>]>,
}

impl<T> ObjectPool<T> {
    /// Creates a pool with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is `0` or exceeds `10_000` — pool sizing is a
    /// construction-time decision, not a runtime one, so a bad value is a
    /// programming error rather than something worth threading a `Result`
    /// through every caller for.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity > 0 && capacity <= 10_000,
            "object pool capacity must be in 1..=10_000, got {capacity}"
        );
        let slots = (0..capacity)
            .map(|_| ArcSwapOption::empty())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { slots }
    }

    /// Attempts to return `value` to the pool.
    ///
    /// Returns `Err(value)` handing the value back if every slot was
    /// occupied at the moment it was scanned. A lost compare-and-swap on one
    /// slot just advances the scan to the next slot; `try_add` never
    /// retries the same slot.
    pub fn try_add(&self, value: Arc<T>) -> Result<(), Arc<T>> {
        for slot in self.slots.iter() {
            if slot.load().is_some() {
                continue;
            }
            let prev = slot.compare_and_swap(&None::<Arc<T>>, Some(Arc::clone(&value)));
            if prev.is_none() {
                return Ok(());
            }
        }
        Err(value)
    }

    /// Attempts to pull an instance out of the pool.
    ///
    /// Returns `None` if every slot was empty at the moment it was
    /// scanned (spurious misses under contention are acceptable; the
    /// fallback is allocation).
    pub fn try_pull(&self) -> Option<Arc<T>> {
        for slot in self.slots.iter() {
            if slot.load().is_none() {
                continue;
            }
            let prev = slot.swap(None);
            if prev.is_some() {
                return prev;
            }
        }
        None
    }

    /// Number of slots (capacity), not current occupancy.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
