use aggmetrics::{
    AggregationConfig, AggregationCycleDriver, DriverState, MetricCollectionManager, MetricKind,
    SubmissionSink,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct RecordingSink {
    cycle_timestamps: Mutex<Vec<chrono::DateTime<chrono::Utc>>>,
}

impl SubmissionSink for RecordingSink {
    fn submit_metrics(&self, aggregates: &[aggmetrics::Aggregate]) {
        let mut ts = self.cycle_timestamps.lock();
        for a in aggregates {
            ts.push(a.period_end_timestamp);
        }
    }
}

#[test]
fn driver_runs_cycles_on_the_configured_schedule_and_shuts_down_cleanly() {
    let manager = Arc::new(MetricCollectionManager::<std::hash::RandomState>::default());
    let sink = Arc::new(RecordingSink {
        cycle_timestamps: Mutex::new(Vec::new()),
    });
    manager.set_submission_sink(sink.clone());
    manager
        .get_or_add_metric("driver.heartbeat", MetricKind::Count, Vec::new())
        .unwrap();

    let driver = AggregationCycleDriver::new(
        AggregationConfig {
            aggregation_period_length_seconds: 5,
        },
        manager,
    )
    .unwrap();

    driver.start().unwrap();
    assert_eq!(driver.state(), DriverState::Running);

    let deadline = Instant::now() + Duration::from_secs(12);
    while sink.cycle_timestamps.lock().is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(100));
    }

    driver.shutdown();
    assert!(driver.state().is_terminal());

    let fired_before_shutdown = sink.cycle_timestamps.lock().len();
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(
        sink.cycle_timestamps.lock().len(),
        fired_before_shutdown,
        "no cycle callback may fire after shutdown returns"
    );
}

#[test]
fn rejects_an_out_of_range_period_length() {
    let manager = Arc::new(MetricCollectionManager::<std::hash::RandomState>::default());
    let result = AggregationCycleDriver::new(
        AggregationConfig {
            aggregation_period_length_seconds: 7,
        },
        manager,
    );
    assert!(result.is_err());
}
