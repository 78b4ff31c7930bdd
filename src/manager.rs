//! Orchestrates metric registration and the per-cycle swap-and-submit
//! sweep (spec §4.7, §4.8).

use crate::aggregate::Aggregate;
use crate::error::MetricsError;
use crate::identity::{MetricIdentity, MetricTag};
use crate::metric::{Metric, MetricKind, PendingFinish};
use crate::registry::MetricsSet;
use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Utc};
use std::hash::{BuildHasher, RandomState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Block size for the fetch-and-submit sweep (spec §4.8 step 2).
const SUBMISSION_BLOCK_SIZE: usize = 2000;

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

/// External collaborator that receives finalized aggregates (spec §6).
///
/// The sink is invoked in blocks, possibly more than one per cycle; it must
/// not assume all of one cycle's aggregates arrive contiguously (spec §4.8
/// ordering contract).
pub trait SubmissionSink: Send + Sync {
    fn submit_metrics(&self, aggregates: &[Aggregate]);
}

/// Orchestrates swap-and-submit across all registered metrics for one
/// cycle boundary, and owns the lock-free metric registry.
pub struct MetricCollectionManager<S = RandomState> {
    id: u64,
    metrics: ArcSwap<MetricsSet<S>>,
    hasher: S,
    sink: ArcSwapOption<dyn SubmissionSink>,
}

impl<S: BuildHasher + Clone + Default> Default for MetricCollectionManager<S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<S: BuildHasher + Clone> MetricCollectionManager<S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
            metrics: ArcSwap::from_pointee(MetricsSet::empty(hasher.clone())),
            hasher,
            sink: ArcSwapOption::empty(),
        }
    }

    /// `GetOrAddMetric` (spec §4.7): returns the existing metric if the
    /// identity is already registered, otherwise constructs, attaches, and
    /// publishes a new one via compare-and-set, retrying on a lost race.
    ///
    /// # Errors
    /// Returns [`MetricsError::Misuse`] if the newly constructed metric
    /// could not be attached to this manager (unreachable through this API
    /// today, since metrics are always constructed here — kept because
    /// `Metric::try_attach` enforces single ownership, see DESIGN.md).
    pub fn get_or_add_metric(
        &self,
        name: impl Into<String>,
        kind: MetricKind,
        tags: Vec<MetricTag>,
    ) -> Result<Arc<Metric>, MetricsError> {
        let identity = MetricIdentity::new(name, tags);
        loop {
            let current = self.metrics.load();
            if let Some(existing) = current.get(identity.canonical()) {
                return Ok(Arc::clone(existing));
            }

            let candidate = Metric::new(identity.clone(), kind);
            if !candidate.try_attach(self.id) {
                return Err(MetricsError::Misuse(
                    "metric is already attached to a different manager".to_string(),
                ));
            }

            let (updated, returned) = current.with_added(Arc::clone(&candidate), &self.hasher);
            if !Arc::ptr_eq(&returned, &candidate) {
                // Another thread's add won the race inside this snapshot
                // comparison; nothing to publish.
                candidate.try_detach(self.id);
                return Ok(returned);
            }

            let prev = self.metrics.compare_and_swap(&current, Arc::new(updated));
            if Arc::ptr_eq(&prev, &current) {
                return Ok(candidate);
            }
            candidate.try_detach(self.id);
        }
    }

    /// `TryRemoveMetric` (spec §4.7).
    pub fn try_remove_metric(&self, canonical_identity: &str) -> bool {
        loop {
            let current = self.metrics.load();
            let Some(updated) = current.with_removed(canonical_identity, &self.hasher) else {
                return false;
            };
            if let Some(metric) = current.get(canonical_identity) {
                metric.try_detach(self.id);
            }
            let prev = self.metrics.compare_and_swap(&current, Arc::new(updated));
            if Arc::ptr_eq(&prev, &current) {
                return true;
            }
        }
    }

    #[must_use]
    pub fn try_get_metric(&self, canonical_identity: &str) -> Option<Arc<Metric>> {
        self.metrics.load().get(canonical_identity).map(Arc::clone)
    }

    #[must_use]
    pub fn get_metrics(&self) -> Vec<Arc<Metric>> {
        self.metrics.load().iter().cloned().collect()
    }

    #[must_use]
    pub fn get_metrics_named(&self, name: &str) -> Vec<Arc<Metric>> {
        self.metrics
            .load()
            .by_name(name)
            .cloned()
            .collect()
    }

    pub fn set_submission_sink(&self, sink: Arc<dyn SubmissionSink>) {
        self.sink.store(Some(sink));
    }

    /// The fetch-and-submit cycle step (spec §4.8), invoked once per
    /// aggregation period by the cycle driver.
    pub fn run_cycle(&self, ts_rounded: DateTime<Utc>) {
        let snapshot = self.metrics.load_full();
        let tick_now = Instant::now();

        // Pass 1 (step 4): tight loop over every metric, minimal work per
        // iteration to bound timestamp divergence across metrics.
        let mut pendings: Vec<(Arc<Metric>, PendingFinish)> =
            Vec::with_capacity(snapshot.len());
        for metric in snapshot.iter() {
            let pending = metric.start_next_period(ts_rounded, tick_now);
            pendings.push((Arc::clone(metric), pending));
        }

        // Pass 2 (steps 5-7): finalize and submit in blocks, recycling each
        // metric's outgoing aggregator as its block finishes.
        let mut rest = pendings.into_iter();
        loop {
            let block: Vec<_> = rest.by_ref().take(SUBMISSION_BLOCK_SIZE).collect();
            if block.is_empty() {
                break;
            }
            let aggregates: Vec<Aggregate> = block
                .into_iter()
                .map(|(metric, pending)| metric.finish_and_recycle(pending, ts_rounded, tick_now))
                .collect();

            if let Some(sink) = self.sink.load().as_ref() {
                sink.submit_metrics(&aggregates);
            }
        }
    }
}
