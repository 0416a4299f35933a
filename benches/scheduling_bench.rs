//! Benchmarks for the scheduling engine.
//!
//! Benchmarks cover:
//! - Entitlement resolution over generated orders
//! - Group constraint aggregation
//! - Teacher availability matching
//! - Bulk workflow transitions on a populated store

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use class_scheduling::config::ExpiryRuleConfig;
use class_scheduling::core::{
    compute_group_constraints, match_teacher_availability, Actor, ClassGroup, ClassGroupStatus,
    DateRange, EntitlementResolver, ExclusionSet, NewScheduleEvent, OrderProductRecord,
    OrderRecord, ScheduleCondition, ScheduleEventStore, ScheduleScope, ScheduleType,
    ScheduleWorkflow, TeacherAvailabilityWindow, TeacherOpenTime, WindowKind,
};
use class_scheduling::infra::RuleTableExpiryLookup;

// ============================================================================
// Helper Functions
// ============================================================================

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn class_group() -> ClassGroup {
    ClassGroup {
        id: "bench-class".into(),
        name: "Bench".into(),
        schedule_type: ScheduleType::Group,
        campus_id: Some("north".into()),
        language: Some("中文".into()),
        min_students: 1,
        max_students: 50,
        materials: Vec::new(),
        status: ClassGroupStatus::Draft,
        order_ids: Vec::new(),
        created_at: now(),
        updated_at: now(),
    }
}

fn build_orders(count: u64, rng: &mut StdRng) -> Vec<OrderRecord> {
    (0..count)
        .map(|i| {
            let language = if rng.random_bool(0.8) { "中文" } else { "English" };
            let status = if rng.random_bool(0.9) { "SUCCESS" } else { "EXPIRED" };
            OrderRecord {
                id: format!("order-{i}"),
                member_id: format!("student-{}", i % 40),
                status: status.into(),
                created_at: now(),
                expired_at: None,
                options: json!({"campus": "north"}),
                products: vec![OrderProductRecord {
                    id: format!("product-{i}"),
                    name: "course".into(),
                    ended_at: None,
                    options: json!({
                        "classType": "group",
                        "language": language,
                        "totalSessions": rng.random_range(1..=30u32),
                    }),
                }],
            }
        })
        .collect()
}

fn rules() -> RuleTableExpiryLookup {
    RuleTableExpiryLookup::new(vec![
        ExpiryRuleConfig {
            language: Some("中文".into()),
            min_sessions: 1,
            max_sessions: Some(10),
            validity_days: 90,
        },
        ExpiryRuleConfig {
            language: None,
            min_sessions: 1,
            max_sessions: None,
            validity_days: 365,
        },
    ])
}

// ============================================================================
// Entitlement Benchmarks
// ============================================================================

fn bench_resolve_entitlements(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_entitlements");
    let rules = rules();
    let class = class_group();
    let condition = ScheduleCondition::starting(start_date());

    for size in [100, 1_000, 10_000] {
        let mut rng = StdRng::seed_from_u64(size);
        let orders = build_orders(size, &mut rng);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &orders, |b, orders| {
            let resolver = EntitlementResolver::new(&rules, 50);
            b.iter(|| black_box(resolver.resolve(orders, &class, &condition, now())));
        });
    }
    group.finish();
}

fn bench_group_constraints(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_constraints");
    let rules = rules();
    let class = class_group();
    let condition = ScheduleCondition::starting(start_date());

    for size in [100, 1_000, 10_000] {
        let mut rng = StdRng::seed_from_u64(size);
        let orders = build_orders(size, &mut rng);
        let entitlements = EntitlementResolver::new(&rules, 50).resolve(&orders, &class, &condition, now());
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &entitlements, |b, set| {
            b.iter(|| black_box(compute_group_constraints(set)));
        });
    }
    group.finish();
}

// ============================================================================
// Availability Benchmarks
// ============================================================================

fn bench_match_availability(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_availability");
    let teachers: Vec<String> = (0..10).map(|i| format!("teacher-{i}")).collect();

    for days in [30u64, 180] {
        let mut rng = StdRng::seed_from_u64(days);
        let mut open_time = TeacherOpenTime::default();
        for day in 0..days {
            let date = start_date().checked_add_days(Days::new(day)).unwrap();
            for teacher in &teachers {
                let start_h = rng.random_range(8..12u32);
                let window = |from: u32, to: u32, kind| TeacherAvailabilityWindow {
                    teacher_id: Some(teacher.clone()),
                    start: date.and_hms_opt(from, 0, 0).unwrap(),
                    end: date.and_hms_opt(to, 0, 0).unwrap(),
                    kind,
                };
                open_time.events.push(window(start_h, start_h + 6, WindowKind::Open));
                open_time.busy_events.push(window(start_h + 1, start_h + 2, WindowKind::Busy));
            }
        }
        let condition = ScheduleCondition::starting(start_date());
        let range = DateRange::from_condition(&condition, days);
        let exclusions = ExclusionSet::from_dates([start_date()]);

        group.bench_with_input(BenchmarkId::from_parameter(days), &open_time, |b, open_time| {
            b.iter(|| black_box(match_teacher_availability(&teachers, &range, &exclusions, open_time)));
        });
    }
    group.finish();
}

// ============================================================================
// Workflow Benchmarks
// ============================================================================

fn bench_pre_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("pre_schedule");

    for size in [100u64, 1_000, 5_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let workflow = ScheduleWorkflow::new(Arc::new(ScheduleEventStore::new("bench-tenant")));
                for i in 0..size {
                    workflow.create_event(NewScheduleEvent {
                        id: None,
                        schedule_type: ScheduleType::Group,
                        class_id: Some(format!("class-{}", i % 10)),
                        date: start_date().checked_add_days(Days::new(i % 60)).unwrap(),
                        start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                        end_time: NaiveTime::from_hms_opt(10, 50, 0).unwrap(),
                        teacher_id: None,
                        student_ids: vec!["student-1".into()],
                        order_ids: vec!["order-1".into()],
                        campus: None,
                        language: None,
                        status: None,
                        created_by: Actor::default(),
                    });
                }
                let scope = ScheduleScope::class(ScheduleType::Group, "class-0");
                black_box(workflow.pre_schedule(&scope));
            });
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(
    entitlement_benches,
    bench_resolve_entitlements,
    bench_group_constraints
);

criterion_group!(availability_benches, bench_match_availability);

criterion_group!(workflow_benches, bench_pre_schedule);

criterion_main!(entitlement_benches, availability_benches, workflow_benches);
