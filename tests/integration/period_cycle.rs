use aggmetrics::{AggregatePayload, MetricCollectionManager, MetricKind, SubmissionSink};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;

struct RecordingSink {
    cycles: Mutex<Vec<Vec<aggmetrics::Aggregate>>>,
}

impl SubmissionSink for RecordingSink {
    fn submit_metrics(&self, aggregates: &[aggmetrics::Aggregate]) {
        self.cycles.lock().push(aggregates.to_vec());
    }
}

#[test]
fn scenario_four_two_periods_in_sequence() {
    let manager: MetricCollectionManager = MetricCollectionManager::default();
    let sink = Arc::new(RecordingSink {
        cycles: Mutex::new(Vec::new()),
    });
    manager.set_submission_sink(sink.clone());
    let metric = manager
        .get_or_add_metric("queue.depth", MetricKind::Measurement, Vec::new())
        .unwrap();

    manager.run_cycle(Utc::now());
    metric.collect(10.0);
    metric.collect(20.0);
    manager.run_cycle(Utc::now());
    metric.collect(30.0);
    manager.run_cycle(Utc::now());

    let cycles = sink.cycles.lock();
    assert_eq!(cycles.len(), 2);
    assert_eq!(
        cycles[0][0].payload,
        AggregatePayload::Measurement {
            count: 2,
            sum: 30.0,
            min: 10.0,
            max: 20.0,
            std_dev: 5.0,
        }
    );
    assert_eq!(
        cycles[1][0].payload,
        AggregatePayload::Measurement {
            count: 1,
            sum: 30.0,
            min: 30.0,
            max: 30.0,
            std_dev: 0.0,
        }
    );
}

#[test]
fn previous_period_aggregate_is_frozen_after_boundary() {
    let manager: MetricCollectionManager = MetricCollectionManager::default();
    let sink = Arc::new(RecordingSink {
        cycles: Mutex::new(Vec::new()),
    });
    manager.set_submission_sink(sink.clone());
    let metric = manager
        .get_or_add_metric("errors", MetricKind::Count, Vec::new())
        .unwrap();

    manager.run_cycle(Utc::now());
    metric.collect(5);
    manager.run_cycle(Utc::now());
    // samples collected after the boundary belong to the new period only.
    metric.collect(100);

    let cycles = sink.cycles.lock();
    assert_eq!(cycles[0][0].payload, AggregatePayload::Count { sum: 5 });
}
