//! Immutable-snapshot metric registry (spec §3, §4.7).

use crate::identity::MetricIdentity;
use crate::metric::Metric;
use std::collections::HashMap;
use std::hash::{BuildHasher, RandomState};
use std::sync::Arc;

/// A copy-on-write snapshot of every live metric.
///
/// Mutations never touch an existing `MetricsSet`; they build a new one and
/// the manager swaps it in via compare-and-set. A reference held across a
/// mutation keeps enumerating the pre-mutation contents (spec §8 Snapshot
/// immutability property).
pub struct MetricsSet<S = RandomState> {
    ordered: Arc<[Arc<Metric>]>,
    by_identity: Arc<HashMap<String, Arc<Metric>, S>>,
}

impl<S: BuildHasher + Clone + Default> Default for MetricsSet<S> {
    fn default() -> Self {
        Self {
            ordered: Arc::from(Vec::new().into_boxed_slice()),
            by_identity: Arc::new(HashMap::default()),
        }
    }
}

impl<S: BuildHasher + Clone> MetricsSet<S> {
    pub(crate) fn empty(hasher: S) -> Self {
        Self {
            ordered: Arc::from(Vec::new().into_boxed_slice()),
            by_identity: Arc::new(HashMap::with_hasher(hasher)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    #[must_use]
    pub fn get(&self, canonical_identity: &str) -> Option<&Arc<Metric>> {
        self.by_identity.get(canonical_identity)
    }

    /// Linear scan by name — names are not uniquely indexed, since the same
    /// name may have many tag-distinct identities (spec §4.7 `GetMetrics`).
    pub fn by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Arc<Metric>> + 'a {
        self.ordered.iter().filter(move |m| m.identity().name() == name)
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Metric>> {
        self.ordered.iter()
    }

    /// Builds a new snapshot with `metric` added, unless an entry with the
    /// same canonical identity already exists (in which case the existing
    /// metric is returned instead of a new snapshot).
    #[must_use]
    pub(crate) fn with_added(&self, metric: Arc<Metric>, hasher: &S) -> (Self, Arc<Metric>) {
        if let Some(existing) = self.by_identity.get(metric.identity().canonical()) {
            return (self.clone_shared(), Arc::clone(existing));
        }

        let mut ordered = Vec::with_capacity(self.ordered.len() + 1);
        ordered.extend(self.ordered.iter().cloned());
        ordered.push(Arc::clone(&metric));

        let mut by_identity =
            HashMap::with_capacity_and_hasher(self.by_identity.len() + 1, hasher.clone());
        by_identity.extend(
            self.by_identity
                .iter()
                .map(|(k, v)| (k.clone(), Arc::clone(v))),
        );
        by_identity.insert(metric.identity().canonical().to_string(), Arc::clone(&metric));

        (
            Self {
                ordered: Arc::from(ordered.into_boxed_slice()),
                by_identity: Arc::new(by_identity),
            },
            metric,
        )
    }

    /// Builds a new snapshot with the entry for `canonical_identity` removed.
    /// Returns `None` if no such entry exists (no new snapshot is built).
    #[must_use]
    pub(crate) fn with_removed(&self, canonical_identity: &str, hasher: &S) -> Option<Self> {
        if !self.by_identity.contains_key(canonical_identity) {
            return None;
        }

        let ordered: Vec<_> = self
            .ordered
            .iter()
            .filter(|m| m.identity().canonical() != canonical_identity)
            .cloned()
            .collect();

        let mut by_identity =
            HashMap::with_capacity_and_hasher(self.by_identity.len(), hasher.clone());
        by_identity.extend(
            self.by_identity
                .iter()
                .filter(|(k, _)| k.as_str() != canonical_identity)
                .map(|(k, v)| (k.clone(), Arc::clone(v))),
        );

        Some(Self {
            ordered: Arc::from(ordered.into_boxed_slice()),
            by_identity: Arc::new(by_identity),
        })
    }

    fn clone_shared(&self) -> Self {
        Self {
            ordered: Arc::clone(&self.ordered),
            by_identity: Arc::clone(&self.by_identity),
        }
    }
}

// MetricsSet is cheap to clone: it shares the underlying ordered slice and
// map, never deep-copies them (spec §4.7 rationale: reads are a pointer
// load).
impl<S: BuildHasher + Clone> Clone for MetricsSet<S> {
    fn clone(&self) -> Self {
        self.clone_shared()
    }
}
