use aggmetrics::{MetricCollectionManager, MetricKind};
use std::sync::Arc;

#[test]
fn scenario_five_registry_round_trip() {
    let manager: MetricCollectionManager = MetricCollectionManager::default();
    let a = manager
        .get_or_add_metric("id_a", MetricKind::Count, Vec::new())
        .unwrap();
    let b = manager
        .get_or_add_metric("id_a", MetricKind::Count, Vec::new())
        .unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    assert!(manager.try_remove_metric("id_a"));
    assert!(!manager.try_remove_metric("id_a"));
}

#[test]
fn snapshot_held_across_a_mutation_still_sees_the_old_contents() {
    let manager: MetricCollectionManager = MetricCollectionManager::default();
    manager
        .get_or_add_metric("a", MetricKind::Count, Vec::new())
        .unwrap();
    let snapshot = manager.get_metrics();
    assert_eq!(snapshot.len(), 1);

    manager
        .get_or_add_metric("b", MetricKind::Count, Vec::new())
        .unwrap();
    assert_eq!(snapshot.len(), 1, "the held snapshot must not observe the later add");
    assert_eq!(manager.get_metrics().len(), 2);
}

#[test]
fn concurrent_registry_cas_for_the_same_identity_yields_one_instance() {
    let manager = Arc::new(MetricCollectionManager::<std::hash::RandomState>::default());
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                manager
                    .get_or_add_metric("shared", MetricKind::Count, Vec::new())
                    .unwrap()
            })
        })
        .collect();
    let metrics: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for m in &metrics[1..] {
        assert!(Arc::ptr_eq(&metrics[0], m));
    }
    assert_eq!(manager.get_metrics().len(), 1);
}

#[test]
fn get_metrics_named_finds_every_tag_variant() {
    let manager: MetricCollectionManager = MetricCollectionManager::default();
    manager
        .get_or_add_metric(
            "api.latency",
            MetricKind::Measurement,
            aggmetrics::parse_many("route:get").unwrap(),
        )
        .unwrap();
    manager
        .get_or_add_metric(
            "api.latency",
            MetricKind::Measurement,
            aggmetrics::parse_many("route:put").unwrap(),
        )
        .unwrap();
    manager
        .get_or_add_metric("other", MetricKind::Count, Vec::new())
        .unwrap();

    assert_eq!(manager.get_metrics_named("api.latency").len(), 2);
}
