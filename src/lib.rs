//! # aggmetrics
//!
//! In-process metrics aggregation core: a lock-free hot path for recording
//! samples, a periodic swap-and-submit rollup cycle, and a pluggable
//! submission sink for whatever transport or storage a caller wants.
//!
//! ## Features
//!
//! - **Lock-free hot path**: `Metric::collect` never blocks a producer
//!   thread behind a mutex on the common path.
//! - **Copy-on-write registry**: registering and removing metrics swaps an
//!   immutable snapshot; readers never observe a half-built registry.
//! - **Two metric kinds**: `Count` (running integer sum) and `Measurement`
//!   (count/sum/min/max/std-dev over a bounded sample buffer).
//! - **Dedicated cycle driver**: a background thread wakes on a slot-aligned
//!   schedule and hands finalized aggregates to a `SubmissionSink`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use aggmetrics::{MetricCollectionManager, MetricKind, SubmissionSink, Aggregate};
//! use std::sync::Arc;
//!
//! struct StdoutSink;
//! impl SubmissionSink for StdoutSink {
//!     fn submit_metrics(&self, aggregates: &[Aggregate]) {
//!         for a in aggregates {
//!             println!("{:?}", a.payload);
//!         }
//!     }
//! }
//!
//! let manager: MetricCollectionManager = MetricCollectionManager::default();
//! manager.set_submission_sink(Arc::new(StdoutSink));
//!
//! let errors = manager.get_or_add_metric("errors.total", MetricKind::Count, Vec::new()).unwrap();
//! errors.collect(1);
//!
//! manager.run_cycle(chrono::Utc::now());
//! ```

// #![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
//#![deny(clippy::unreachable)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Disabled because it reports false duplicate-crate errors from dev-dependencies
//#![warn(clippy::cargo)]
#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![warn(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod aggregate;
mod aggregator;
mod buffer;
mod config;
mod driver;
mod error;
mod identity;
mod latch;
mod macros;
mod manager;
mod metric;
mod period;
mod pool;
mod registry;

pub use aggregate::{Aggregate, AggregatePayload};
pub use config::AggregationConfig;
pub use driver::{AggregationCycleDriver, DriverState};
pub use error::MetricsError;
pub use identity::{parse_many, MetricIdentity, MetricTag};
pub use manager::{MetricCollectionManager, SubmissionSink};
pub use metric::{Metric, MetricKind, Sample};

/// Result type for metric operations.
///
/// Wraps errors that can occur during metric registration and configuration.
pub type MetricResult<T> = Result<T, MetricsError>;
