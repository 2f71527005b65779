use plc_telemetry::{metrics, new_request_ids, record_device_read_failure, record_poll_cycle};

#[test]
fn request_ids_non_empty() {
    let ids = new_request_ids();
    assert!(!ids.request_id.is_empty());
    assert!(!ids.trace_id.is_empty());
    assert_ne!(ids.request_id, ids.trace_id);
}

#[test]
fn poll_metrics_accumulate() {
    let before = metrics().snapshot();
    record_poll_cycle(40);
    record_poll_cycle(1200);
    record_device_read_failure();
    let after = metrics().snapshot();

    assert_eq!(after.poll_cycles - before.poll_cycles, 2);
    assert_eq!(after.device_read_failure - before.device_read_failure, 1);
    assert!(after.cycle_latency_ms_total - before.cycle_latency_ms_total >= 1240);
    assert!(after.cycle_latency_ms_max >= 1200);
}
