//! Tests for runtime API types and arrangement sessions

use chrono::{NaiveDate, NaiveTime, Utc};

use class_scheduling::core::{
    Actor, ClassGroup, ClassGroupPatch, ClassGroupStatus, ConstraintViolation, ProposedSession,
    ScheduleCondition, ScheduleType,
};
use class_scheduling::runtime::{ArrangementResult, ArrangementSession};

fn group() -> ClassGroup {
    ClassGroup {
        id: "c1".into(),
        name: "Group A".into(),
        schedule_type: ScheduleType::Semester,
        campus_id: None,
        language: Some("English".into()),
        min_students: 1,
        max_students: 8,
        materials: vec!["Workbook 1".into()],
        status: ClassGroupStatus::Draft,
        order_ids: vec!["o1".into()],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
}

#[test]
fn test_language_change_resets_teachers() {
    let mut session = ArrangementSession::new(group(), ScheduleCondition::starting(day(1)));
    session.select_teachers(vec!["t1".to_string()]);

    let patch = ClassGroupPatch {
        language: Some(Some("中文".into())),
        ..ClassGroupPatch::default()
    };
    assert!(session.apply_settings(&patch));
    assert!(session.selected_teachers().is_empty());
    assert_eq!(session.class_group().language.as_deref(), Some("中文"));
}

#[test]
fn test_to_request_carries_session_state() {
    let mut session = ArrangementSession::new(group(), ScheduleCondition::starting(day(1)));
    let mut condition = ScheduleCondition::starting(day(2));
    condition.end_date = Some(day(30));
    session.set_condition(condition.clone());

    let picked = ProposedSession {
        date: day(3),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(9, 50, 0).unwrap(),
        teacher_id: Some("t1".into()),
    };
    let request = session.to_request(vec![picked], Actor::new("op-1", "op@example.com"));
    assert_eq!(request.class_group.id, "c1");
    assert_eq!(request.condition, condition);
    assert_eq!(request.proposal.total_minutes(), 50);
    assert_eq!(request.actor.email.as_deref(), Some("op@example.com"));
    assert_eq!(session.search_range(180).end, day(30));
}

#[test]
fn test_arrangement_result_serialization() {
    let rejected = ArrangementResult::Rejected {
        violations: vec![ConstraintViolation::ExcludedDate { date: day(5) }],
    };
    assert_eq!(rejected.reasons(), vec!["session on 2026-04-05 falls on an excluded date"]);

    let json = serde_json::to_value(&rejected).unwrap();
    assert_eq!(json["result"], "rejected");

    let booked = ArrangementResult::Booked { events: Vec::new() };
    assert!(booked.reasons().is_empty());
    assert_eq!(serde_json::to_value(&booked).unwrap()["result"], "booked");
}
