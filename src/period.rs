//! Period timestamp bookkeeping shared by every aggregator kind (spec §3).

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Rounded wall-clock bounds plus a monotonic pair for exact duration.
///
/// `start_instant`/`end_instant` give an exact, non-wrapping monotonic
/// duration independent of wall-clock adjustment or rounding.
#[derive(Clone, Copy)]
pub struct PeriodWindow {
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    pub start_instant: Instant,
    pub end_instant: Instant,
}

impl PeriodWindow {
    #[must_use]
    pub fn finished_duration(&self) -> Duration {
        self.end_instant.saturating_duration_since(self.start_instant)
    }
}

impl Default for PeriodWindow {
    fn default() -> Self {
        let now_instant = Instant::now();
        let now_ts = Utc::now();
        Self {
            start_ts: now_ts,
            end_ts: now_ts,
            start_instant: now_instant,
            end_instant: now_instant,
        }
    }
}
