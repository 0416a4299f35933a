//! Tests for utility functions

use class_scheduling::util::{init_tracing, new_event_id, now_ms, now_utc, EventId};

#[test]
fn test_event_ids_are_unique() {
    let a: EventId = new_event_id();
    let b: EventId = new_event_id();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}

#[test]
fn test_clock_is_monotonic_enough() {
    let before = now_ms();
    let utc = now_utc();
    assert!(before > 0);
    assert!(u128::try_from(utc.timestamp_millis()).unwrap() >= before);
}

#[test]
fn test_init_tracing_is_repeatable() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialised twice");
}
