//! Aggregation cycle driver: dedicated thread, slot-aligned wait loop,
//! cooperative shutdown (spec §4.9).

use crate::config::AggregationConfig;
use crate::error::MetricsError;
use crate::manager::MetricCollectionManager;
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use crossbeam::channel::{bounded, select, Receiver, Sender};
use parking_lot::Mutex;
use std::hash::{BuildHasher, RandomState};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::error;

/// Driver lifecycle (spec §4.9, §9 Open Question: `ShutdownCompleted` and
/// `Disposed` are given distinct discriminants here; both are terminal).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    NotStarted = 0,
    Running = 1,
    ShutdownRequested = 2,
    ShutdownCompleted = 3,
    Disposed = 4,
}

impl DriverState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::NotStarted,
            1 => Self::Running,
            2 => Self::ShutdownRequested,
            3 => Self::ShutdownCompleted,
            _ => Self::Disposed,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ShutdownCompleted | Self::Disposed)
    }
}

/// Poll-sleep schedule `Shutdown()` callers cycle through while waiting for
/// the worker to exit (spec §4.9).
const SHUTDOWN_POLL_SCHEDULE_MS: [u64; 7] = [1, 1, 1, 25, 50, 100, 500];

/// Drives the periodic swap-and-submit cycle on a dedicated worker thread
/// that never shares a stack with producer threads (spec §5).
pub struct AggregationCycleDriver<S = RandomState> {
    config: AggregationConfig,
    manager: Arc<MetricCollectionManager<S>>,
    state: Arc<AtomicU8>,
    shutdown_tx: Sender<()>,
    shutdown_rx: Receiver<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<S: BuildHasher + Clone + Send + Sync + 'static> AggregationCycleDriver<S> {
    /// # Errors
    /// Returns [`MetricsError::Configuration`] if `config` fails
    /// [`AggregationConfig::validate`].
    pub fn new(
        config: AggregationConfig,
        manager: Arc<MetricCollectionManager<S>>,
    ) -> Result<Self, MetricsError> {
        config.validate()?;
        let (shutdown_tx, shutdown_rx) = bounded(1);
        Ok(Self {
            config,
            manager,
            state: Arc::new(AtomicU8::new(DriverState::NotStarted as u8)),
            shutdown_tx,
            shutdown_rx,
            worker: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn state(&self) -> DriverState {
        DriverState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Starts the worker. Succeeds only from `NotStarted` (spec §4.9).
    ///
    /// # Errors
    /// Returns [`MetricsError::Misuse`] if the driver was already started.
    pub fn start(&self) -> Result<(), MetricsError> {
        let transitioned = self
            .state
            .compare_exchange(
                DriverState::NotStarted as u8,
                DriverState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if !transitioned {
            return Err(MetricsError::Misuse(
                "aggregation cycle driver can only be started once".to_string(),
            ));
        }

        let manager = Arc::clone(&self.manager);
        let state = Arc::clone(&self.state);
        let period_secs = self.config.aggregation_period_length_seconds;
        let shutdown_rx = self.shutdown_rx.clone();

        let handle = thread::Builder::new()
            .name("aggregation-cycle".to_string())
            .spawn(move || run_loop(period_secs, &manager, &state, &shutdown_rx))
            .map_err(|e| {
                MetricsError::Configuration(format!("failed to spawn cycle driver thread: {e}"))
            })?;
        *self.worker.lock() = Some(handle);
        Ok(())
    }

    /// Requests shutdown and blocks until the worker has exited and been
    /// joined (spec §4.9).
    pub fn shutdown(&self) {
        let _ = self.state.compare_exchange(
            DriverState::Running as u8,
            DriverState::ShutdownRequested as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        let _ = self.shutdown_tx.send(());

        let mut schedule = SHUTDOWN_POLL_SCHEDULE_MS.iter().cycle();
        while !self.state().is_terminal() {
            thread::sleep(Duration::from_millis(*schedule.next().unwrap_or(&500)));
        }

        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
        self.state.store(DriverState::Disposed as u8, Ordering::Release);
    }
}

fn run_loop<S: BuildHasher + Clone>(
    period_secs: u32,
    manager: &MetricCollectionManager<S>,
    state: &AtomicU8,
    shutdown_rx: &Receiver<()>,
) {
    while state.load(Ordering::Acquire) == DriverState::Running as u8 {
        let now = Utc::now();
        let target = next_target(now, period_secs);
        let wait = (target - now)
            .to_std()
            .unwrap_or(Duration::from_millis(1))
            .max(Duration::from_millis(1));

        select! {
            recv(shutdown_rx) -> _ => break,
            default(wait) => {}
        }

        if state.load(Ordering::Acquire) != DriverState::Running as u8 {
            break;
        }

        let actual = Utc::now();
        let rounded = if (actual - target).num_milliseconds().abs() <= 1500 {
            target
        } else {
            round_down_to_second(actual)
        };

        if let Err(panic) =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| manager.run_cycle(rounded)))
        {
            error!("aggregation cycle iteration failed: {panic:?}");
        }
    }
    state.store(DriverState::ShutdownCompleted as u8, Ordering::Release);
}

/// Computes the next slot-aligned target time (spec §4.9 step 1).
fn next_target(now: DateTime<Utc>, period_secs: u32) -> DateTime<Utc> {
    let minute_floor = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);

    let mut target = if period_secs < 60 {
        let slot = (now.second() / period_secs) * period_secs;
        minute_floor
            + ChronoDuration::seconds(i64::from(slot))
            + ChronoDuration::seconds(i64::from(period_secs))
    } else {
        minute_floor + ChronoDuration::seconds(i64::from(period_secs))
    };

    let min_interval_secs: i64 = if period_secs <= 5 {
        1
    } else if period_secs <= 10 {
        2
    } else if period_secs <= 60 {
        5
    } else {
        15
    };

    if (target - now).num_seconds() <= min_interval_secs {
        target += ChronoDuration::seconds(i64::from(period_secs));
    }
    target
}

fn round_down_to_second(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts - ChronoDuration::nanoseconds(i64::from(ts.timestamp_subsec_nanos()))
}
