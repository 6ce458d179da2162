use super::*;

#[test]
fn test_custom_registry() {
    let registry = Registry::new_custom(Some("ddbtest".to_string()), None).unwrap();
    register_custom_metrics(&registry);

    REQUESTS_TOTAL.with_label_values(&["2"]).inc();
    let metrics = registry.gather();
    let metric_names: Vec<_> = metrics.iter().map(|m| m.get_name()).collect();

    assert!(
        metric_names.contains(&"ddbtest_requests_total"),
        "Missing ddbtest_requests_total"
    );
    assert!(metric_names.contains(&"ddbtest_pool_workers"));
}

#[test]
fn test_counter_increment() {
    let before = REQUESTS_TOTAL.with_label_values(&["test-only"]).get();

    REQUESTS_TOTAL.with_label_values(&["test-only"]).inc();
    REQUESTS_TOTAL.with_label_values(&["test-only"]).inc();

    let value = REQUESTS_TOTAL.with_label_values(&["test-only"]).get();
    assert_eq!(value - before, 2, "Counter should increment correctly");
}

#[test]
fn test_gather_text_exposes_prefixed_names() {
    LIVENESS_EVICTIONS.inc_by(0);

    let text = gather_text();

    assert!(text.contains("ddb_liveness_evictions_total"));
}
