use dk_telemetry::{
    PollMetrics, metrics, record_config_mismatch, record_connect_attempt, record_cycle,
    record_value,
};

#[test]
fn fresh_metrics_start_at_zero() {
    let metrics = PollMetrics::new();
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.cycles, 0);
    assert_eq!(snapshot.readings(), 0);
}

#[test]
fn record_functions_bump_global_counters() {
    // 全局实例在测试间共享，只比较增量。
    let before = metrics().snapshot();
    record_cycle();
    record_value();
    record_value();
    record_config_mismatch();
    record_connect_attempt();
    let after = metrics().snapshot();

    assert!(after.cycles >= before.cycles + 1);
    assert!(after.values >= before.values + 2);
    assert!(after.config_mismatches >= before.config_mismatches + 1);
    assert!(after.connect_attempts >= before.connect_attempts + 1);
    assert!(after.readings() >= before.readings() + 3);
}
