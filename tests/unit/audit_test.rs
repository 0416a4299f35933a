//! Tests for audit sink

use class_scheduling::core::{AuditAction, AuditSink, InMemoryAuditSink, build_audit_event};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event("evt1", "group", "tenant1", AuditAction::Create, Some("payload".to_string()));

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0], event);
    assert_eq!(events[0].subject_id, "evt1");
    assert_eq!(events[0].action, AuditAction::Create);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("evt1", "group", "tenant1", AuditAction::Create, None));
    sink.record(build_audit_event("evt2", "group", "tenant1", AuditAction::Create, None));
    sink.record(build_audit_event("evt3", "group", "tenant1", AuditAction::Create, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].subject_id, "evt2"); // First one popped
    assert_eq!(events[1].subject_id, "evt3");
}

#[test]
fn test_clones_share_the_trail() {
    let sink = InMemoryAuditSink::new(4);
    let mut writer = sink.clone();
    writer.record(build_audit_event("evt1", "group", "tenant1", AuditAction::Edit, None));
    writer.record(build_audit_event("evt2", "group", "tenant1", AuditAction::Delete, None));
    assert_eq!(sink.events().len(), 2);
    assert_eq!(sink.events_for("evt2")[0].action, AuditAction::Delete);
    assert_eq!(AuditAction::PreSchedule.to_string(), "pre_schedule");
}

#[test]
fn test_zero_capacity_sink_drops_everything() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event("evt1", "group", "tenant1", AuditAction::Create, None));
    assert!(sink.events().is_empty());
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event("c1", "semester", "tenant1", AuditAction::Refuse, Some("gate".to_string()));

    assert!(event.event_id.starts_with("c1-refuse-"));
    assert_eq!(event.subject_id, "c1");
    assert_eq!(event.scope, "semester");
    assert_eq!(event.tenant, "tenant1");
    assert_eq!(event.action, AuditAction::Refuse);
    assert_eq!(event.payload, Some("gate".to_string()));
    assert!(event.created_at_ms > 0);
}
