use aggmetrics::{AggregatePayload, MetricCollectionManager, MetricKind};
use chrono::Utc;

struct LastSubmission {
    received: parking_lot::Mutex<Vec<aggmetrics::Aggregate>>,
}

impl aggmetrics::SubmissionSink for LastSubmission {
    fn submit_metrics(&self, aggregates: &[aggmetrics::Aggregate]) {
        self.received.lock().extend_from_slice(aggregates);
    }
}

fn manager_with_sink() -> (MetricCollectionManager, std::sync::Arc<LastSubmission>) {
    let manager: MetricCollectionManager = MetricCollectionManager::default();
    let sink = std::sync::Arc::new(LastSubmission {
        received: parking_lot::Mutex::new(Vec::new()),
    });
    manager.set_submission_sink(sink.clone());
    (manager, sink)
}

#[test]
fn scenario_two_mixed_integral_and_fractional_samples() {
    let (manager, sink) = manager_with_sink();
    let metric = manager
        .get_or_add_metric(
            "errors",
            MetricKind::Count,
            aggmetrics::parse_many("impact:medium,scope:app").unwrap(),
        )
        .unwrap();
    manager.run_cycle(Utc::now());

    assert!(metric.collect(2));
    assert!(metric.collect(3.0));
    assert!(!metric.collect(4.5));
    assert!(metric.collect(1));

    manager.run_cycle(Utc::now());

    let received = sink.received.lock();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].payload, AggregatePayload::Count { sum: 6 });
}

#[test]
fn integrality_property_collect_three_point_zero_adds_three() {
    let (manager, sink) = manager_with_sink();
    let metric = manager
        .get_or_add_metric("x", MetricKind::Count, Vec::new())
        .unwrap();
    manager.run_cycle(Utc::now());
    assert!(metric.collect(3.0));
    manager.run_cycle(Utc::now());
    assert_eq!(sink.received.lock()[0].payload, AggregatePayload::Count { sum: 3 });
}

#[test]
fn integrality_property_collect_three_point_five_is_rejected() {
    let (manager, sink) = manager_with_sink();
    let metric = manager
        .get_or_add_metric("y", MetricKind::Count, Vec::new())
        .unwrap();
    manager.run_cycle(Utc::now());
    assert!(!metric.collect(3.5));
    manager.run_cycle(Utc::now());
    assert_eq!(sink.received.lock()[0].payload, AggregatePayload::Count { sum: 0 });
}

#[test]
fn count_monotonicity_for_an_arbitrary_sequence() {
    let (manager, sink) = manager_with_sink();
    let metric = manager
        .get_or_add_metric("z", MetricKind::Count, Vec::new())
        .unwrap();
    manager.run_cycle(Utc::now());
    let values: [i64; 5] = [7, -3, 100, 0, 42];
    for v in values {
        assert!(metric.collect(v));
    }
    manager.run_cycle(Utc::now());
    let expected: i64 = values.iter().sum();
    assert_eq!(
        sink.received.lock()[0].payload,
        AggregatePayload::Count { sum: expected }
    );
}
