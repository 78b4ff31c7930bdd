//! Convenience macros wrapping [`crate::MetricCollectionManager`] lookups
//! plus a collect call, grounded in the source repo's tag-variadic macro
//! shape.
//!
//! # Performance
//!
//! Each invocation calls `get_or_add_metric`, which takes the registry's
//! CAS path the first time a given name/tag combination is seen. Prefer
//! holding the `Arc<Metric>` returned by `get_or_add_metric` directly and
//! calling `collect` on it in a hot loop instead of re-invoking these macros
//! per sample.

/// Collects a sample against an already-resolved metric handle.
///
/// This is the zero-lookup counterpart to [`count!`]/[`measure!`]: it skips
/// the registry entirely and calls `Metric::collect` directly, for callers
/// holding an `Arc<Metric>` from a prior `get_or_add_metric` in a hot loop.
///
/// # Examples
///
/// ```
/// use aggmetrics::{collect, MetricCollectionManager, MetricKind};
///
/// let manager: MetricCollectionManager = MetricCollectionManager::default();
/// let errors = manager.get_or_add_metric("errors.total", MetricKind::Count, Vec::new()).unwrap();
/// collect!(errors, 1);
/// ```
#[macro_export]
macro_rules! collect {
    ($metric:expr, $value:expr) => {
        $metric.collect($value)
    };
}

/// Records a count sample against a `Count` metric, creating it on first use.
///
/// # Panics
/// Panics if any `$tag` literal fails [`crate::parse_many`].
///
/// # Examples
///
/// ```
/// use aggmetrics::{count, MetricCollectionManager};
///
/// let manager: MetricCollectionManager = MetricCollectionManager::default();
/// count!(manager, "requests.total", 1, "endpoint:api", "method:get");
/// count!(manager, "errors.total", 1);
/// ```
#[macro_export]
macro_rules! count {
    ($manager:expr, $name:expr, $value:expr $(, $tag:expr)*) => {{
        #[allow(unused_mut)]
        let mut segments: Vec<&str> = Vec::new();
        $(segments.push($tag);)*
        let tags = $crate::parse_many(&segments.join(",")).expect("invalid tag literal");
        $manager
            .get_or_add_metric($name, $crate::MetricKind::Count, tags)
            .map(|metric| metric.collect($value))
    }};
}

/// Records a measurement sample against a `Measurement` metric, creating it
/// on first use.
///
/// # Panics
/// Panics if any `$tag` literal fails [`crate::parse_many`].
///
/// # Examples
///
/// ```
/// use aggmetrics::{measure, MetricCollectionManager};
///
/// let manager: MetricCollectionManager = MetricCollectionManager::default();
/// measure!(manager, "api.latency", 12.5, "route:get");
/// measure!(manager, "queue.depth", 3.0);
/// ```
#[macro_export]
macro_rules! measure {
    ($manager:expr, $name:expr, $value:expr $(, $tag:expr)*) => {{
        #[allow(unused_mut)]
        let mut segments: Vec<&str> = Vec::new();
        $(segments.push($tag);)*
        let tags = $crate::parse_many(&segments.join(",")).expect("invalid tag literal");
        $manager
            .get_or_add_metric($name, $crate::MetricKind::Measurement, tags)
            .map(|metric| metric.collect($value))
    }};
}
