//! Core scheduling abstractions: entitlements, constraints, availability,
//! the event store and the publish workflow.

pub mod error;
pub mod model;
pub mod collaborators;
pub mod entitlement;
pub mod constraints;
pub mod availability;
pub mod event_store;
pub mod audit;
pub mod workflow;

pub use error::{AppResult, SchedulingError};
pub use model::{
    Actor, ClassGroup, ClassGroupPatch, ClassGroupStatus, Entitlement, EventPatch, EventStatus,
    Holiday, NewClassGroup, NewScheduleEvent, OrderStatus, ScheduleCondition, ScheduleEvent,
    ScheduleType, TeacherAvailabilityWindow, WindowKind,
};
pub use collaborators::{
    ClassGroupRepository, ExpiryRuleLookup, HolidayProvider, OrderSource, TeacherOpenTime,
    TeacherOpenTimeSource,
};
pub use entitlement::{
    apply_used_minutes, resolve_eligible_entitlements, EntitlementResolver, OrderLineItem,
    OrderProductRecord, OrderRecord, DEFAULT_SESSION_MINUTES,
};
pub use constraints::{
    compute_group_constraints, ConstraintViolation, GroupConstraints, ProposalCheck,
    ProposedSession, SessionProposal,
};
pub use availability::{
    filter_visible_events, match_teacher_availability, AvailabilitySnapshot, DateRange,
    ExclusionSet, DEFAULT_SEARCH_DAYS,
};
pub use event_store::{EventFilter, ScheduleEventStore};
pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use workflow::{
    advance_class_group, paid_student_count, ScheduleScope, ScheduleWorkflow, TransitionOutcome,
    TransitionRefusal,
};
