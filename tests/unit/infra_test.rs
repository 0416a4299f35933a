//! Tests for in-memory collaborator adapters

use chrono::{NaiveDate, TimeZone, Utc};

use class_scheduling::core::{
    ClassGroupPatch, ClassGroupRepository, ClassGroupStatus, HolidayProvider, NewClassGroup,
    OrderRecord, OrderSource, ScheduleType, TeacherAvailabilityWindow, TeacherOpenTimeSource,
    WindowKind,
};
use class_scheduling::infra::{
    InMemoryClassGroupRepository, InMemoryHolidayProvider, InMemoryOrderSource,
    InMemoryTeacherOpenTime,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
}

fn order(id: &str) -> OrderRecord {
    OrderRecord {
        id: id.into(),
        member_id: "s1".into(),
        status: "PENDING".into(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        expired_at: None,
        options: serde_json::Value::Null,
        products: Vec::new(),
    }
}

fn new_group(min: u32, max: u32) -> NewClassGroup {
    NewClassGroup {
        name: "Group A".into(),
        schedule_type: ScheduleType::Group,
        campus_id: None,
        language: None,
        min_students: min,
        max_students: max,
        materials: Vec::new(),
        order_ids: Vec::new(),
    }
}

#[tokio::test]
async fn test_order_source_skips_unknown_ids() {
    let source = InMemoryOrderSource::new([order("o1"), order("o2")]);
    let found = source
        .fetch_orders_by_ids(&["o2".to_string(), "missing".to_string()])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "o2");

    assert!(source.set_status("o2", "SUCCESS"));
    assert!(!source.set_status("missing", "SUCCESS"));
    let found = source.fetch_orders_by_ids(&["o2".to_string()]).await.unwrap();
    assert_eq!(found[0].status, "SUCCESS");
}

#[tokio::test]
async fn test_holiday_provider_returns_dates() {
    let provider = InMemoryHolidayProvider::new([day(1), day(4)]);
    let holidays = provider.fetch_holidays().await.unwrap();
    assert_eq!(holidays.len(), 2);
    assert_eq!(holidays[1].date, day(4));
}

#[tokio::test]
async fn test_teacher_open_time_filters_by_teacher_and_range() {
    let source = InMemoryTeacherOpenTime::new();
    let window = |teacher: Option<&str>, d: u32, kind| TeacherAvailabilityWindow {
        teacher_id: teacher.map(Into::into),
        start: day(d).and_hms_opt(9, 0, 0).unwrap(),
        end: day(d).and_hms_opt(12, 0, 0).unwrap(),
        kind,
    };
    source.add_open(window(Some("t1"), 2, WindowKind::Open));
    source.add_open(window(Some("t2"), 2, WindowKind::Open));
    source.add_open(window(Some("t1"), 20, WindowKind::Open));
    source.add_busy(window(None, 3, WindowKind::Busy));

    let fetched = source
        .fetch_teacher_open_time(&["t1".to_string()], day(1), day(10))
        .await
        .unwrap();
    assert_eq!(fetched.events.len(), 1);
    assert_eq!(fetched.events[0].teacher_id.as_deref(), Some("t1"));
    assert_eq!(fetched.busy_events.len(), 1);
}

#[tokio::test]
async fn test_class_group_repository_lifecycle() {
    let repo = InMemoryClassGroupRepository::new();
    let id = repo.create_class_group(new_group(1, 4)).await.unwrap();
    let created = repo.get(&id).unwrap();
    assert_eq!(created.status, ClassGroupStatus::Draft);

    let patch = ClassGroupPatch {
        max_students: Some(6),
        ..ClassGroupPatch::default()
    };
    repo.update_class_group(&id, patch).await.unwrap();
    assert_eq!(repo.get(&id).unwrap().max_students, 6);

    let invalid = ClassGroupPatch {
        min_students: Some(9),
        ..ClassGroupPatch::default()
    };
    assert!(repo.update_class_group(&id, invalid).await.is_err());
    assert_eq!(repo.get(&id).unwrap().min_students, 1);

    assert_eq!(repo.fetch_class_groups(ScheduleType::Group).await.unwrap().len(), 1);
    assert!(repo.fetch_class_groups(ScheduleType::Personal).await.unwrap().is_empty());

    repo.delete_class_group(&id).await.unwrap();
    assert!(repo.delete_class_group(&id).await.is_err());
    assert!(repo.update_class_group(&id, ClassGroupPatch::default()).await.is_err());
}

#[tokio::test]
async fn test_class_group_repository_rejects_invalid_sizes() {
    let repo = InMemoryClassGroupRepository::new();
    assert!(repo.create_class_group(new_group(3, 2)).await.is_err());
    assert!(repo.create_class_group(new_group(0, 0)).await.is_err());
}
