use aggmetrics::{AggregatePayload, MetricCollectionManager, MetricKind, SubmissionSink};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;

struct RecordingSink {
    received: Mutex<Vec<aggmetrics::Aggregate>>,
}

impl SubmissionSink for RecordingSink {
    fn submit_metrics(&self, aggregates: &[aggmetrics::Aggregate]) {
        self.received.lock().extend_from_slice(aggregates);
    }
}

fn manager_with_sink() -> (MetricCollectionManager, Arc<RecordingSink>) {
    let manager: MetricCollectionManager = MetricCollectionManager::default();
    let sink = Arc::new(RecordingSink {
        received: Mutex::new(Vec::new()),
    });
    manager.set_submission_sink(sink.clone());
    (manager, sink)
}

#[test]
fn scenario_one_basic_stats_with_put_item_tag() {
    let (manager, sink) = manager_with_sink();
    let metric = manager
        .get_or_add_metric(
            "api.latency",
            MetricKind::Measurement,
            aggmetrics::parse_many("route:PutItem").unwrap(),
        )
        .unwrap();
    manager.run_cycle(Utc::now());
    for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
        assert!(metric.collect(v));
    }
    manager.run_cycle(Utc::now());

    let received = sink.received.lock();
    let AggregatePayload::Measurement { count, sum, min, max, std_dev } = received[0].payload
    else {
        panic!("expected Measurement payload");
    };
    assert_eq!(count, 5);
    assert_eq!(sum, 15.0);
    assert_eq!(min, 1.0);
    assert_eq!(max, 5.0);
    assert!((std_dev - 1.414_213_562_4).abs() < 1e-6 * (1.0 + (sum / f64::from(count)).abs()));
}

#[test]
fn scenario_three_nan_excluded_zero_included() {
    let (manager, sink) = manager_with_sink();
    let metric = manager
        .get_or_add_metric(
            "api.latency",
            MetricKind::Measurement,
            aggmetrics::parse_many("route:PutItem").unwrap(),
        )
        .unwrap();
    manager.run_cycle(Utc::now());
    for v in [1.0, 2.0, 3.0, 4.0, 5.0, f64::NAN, 0.0] {
        assert!(metric.collect(v));
    }
    manager.run_cycle(Utc::now());

    let received = sink.received.lock();
    let AggregatePayload::Measurement { count, sum, min, max, .. } = received[0].payload else {
        panic!("expected Measurement payload");
    };
    assert_eq!(count, 6);
    assert_eq!(sum, 15.0);
    assert_eq!(min, 0.0);
    assert_eq!(max, 5.0);
}

#[test]
fn measurement_metric_never_rejects_a_sample_up_front() {
    let (manager, _sink) = manager_with_sink();
    let metric = manager
        .get_or_add_metric("q", MetricKind::Measurement, Vec::new())
        .unwrap();
    manager.run_cycle(Utc::now());
    assert!(metric.collect(f64::NAN));
    assert!(metric.collect(f64::INFINITY));
    assert!(metric.collect(-1.0));
}

#[test]
fn buffer_overflow_within_a_period_rotates_into_a_fresh_buffer() {
    let (manager, sink) = manager_with_sink();
    let metric = manager
        .get_or_add_metric("dense", MetricKind::Measurement, Vec::new())
        .unwrap();
    manager.run_cycle(Utc::now());
    for i in 0..1200 {
        assert!(metric.collect(f64::from(i)));
    }
    manager.run_cycle(Utc::now());

    let received = sink.received.lock();
    let AggregatePayload::Measurement { count, .. } = received[0].payload else {
        panic!("expected Measurement payload");
    };
    assert_eq!(count, 1200);
}
