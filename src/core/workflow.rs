//! Schedule workflow state machine.
//!
//! Events move `pending -> pre-scheduled -> published`; class groups move
//! `draft -> scheduled -> published -> archived`. Nothing moves backwards:
//! reverting means deleting and recreating. Bulk transitions run while the
//! partition lock is held, so two concurrent calls on the same class cannot
//! double-transition an event, and repeating a call is a no-op.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::availability::DateRange;
use crate::core::event_store::ScheduleEventStore;
use crate::core::model::{
    ClassGroup, ClassGroupPatch, ClassGroupStatus, Entitlement, EventPatch, EventStatus,
    NewScheduleEvent, ScheduleEvent, ScheduleType,
};
use crate::util::clock::now_utc;
use crate::util::ids::{ClassGroupId, EventId};

/// Which events a bulk transition touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleScope {
    /// Partition.
    pub schedule_type: ScheduleType,
    /// Class, or every class in the partition when unset.
    pub class_id: Option<ClassGroupId>,
    /// Date range, or all dates when unset.
    pub date_range: Option<DateRange>,
}

impl ScheduleScope {
    /// Every event of one class.
    pub fn class(schedule_type: ScheduleType, class_id: impl Into<ClassGroupId>) -> Self {
        Self {
            schedule_type,
            class_id: Some(class_id.into()),
            date_range: None,
        }
    }

    /// Narrow to a date range.
    #[must_use]
    pub const fn within(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Whether `event` is in scope.
    pub fn matches(&self, event: &ScheduleEvent) -> bool {
        event.schedule_type == self.schedule_type
            && self
                .class_id
                .as_ref()
                .is_none_or(|id| event.class_id.as_ref() == Some(id))
            && self.date_range.is_none_or(|r| r.contains(event.date))
    }
}

/// Result of a bulk transition that was allowed to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// Events moved to `to`.
    Transitioned {
        /// Moved events.
        event_ids: Vec<EventId>,
        /// New status.
        to: EventStatus,
    },
    /// No event was in the source status.
    NothingToDo,
}

impl TransitionOutcome {
    /// Number of events moved.
    pub fn count(&self) -> usize {
        match self {
            Self::Transitioned { event_ids, .. } => event_ids.len(),
            Self::NothingToDo => 0,
        }
    }
}

/// Typed refusal; the state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TransitionRefusal {
    /// Too few paid students to publish.
    #[error("publish needs at least {required} paid students, found {paid}")]
    PublishGateNotMet {
        /// `min_students` of the class.
        required: u32,
        /// Distinct paid students on the class's events.
        paid: usize,
    },
    /// Edit attempted after the event left `pending`.
    #[error("event {id} is {status} and can no longer be edited")]
    EventNotEditable {
        /// Event id.
        id: EventId,
        /// Current status.
        status: EventStatus,
    },
    /// No event with that id.
    #[error("event {0} not found")]
    EventNotFound(EventId),
    /// Class group move not allowed.
    #[error("class group {id} cannot move from {from} to {to}")]
    IllegalClassTransition {
        /// Class id.
        id: ClassGroupId,
        /// Current status.
        from: ClassGroupStatus,
        /// Requested status.
        to: ClassGroupStatus,
    },
    /// Scope and class group disagree.
    #[error("class group {class_id} is outside the requested scope")]
    ScopeMismatch {
        /// Class id.
        class_id: ClassGroupId,
    },
}

/// Distinct students on `events` backed by a paid entitlement.
///
/// When an event lists order ids, only those orders count as backing.
pub fn paid_student_count<'e>(
    events: impl IntoIterator<Item = &'e ScheduleEvent>,
    entitlements: &[Entitlement],
) -> usize {
    let mut paid: HashSet<&str> = HashSet::new();
    for event in events {
        for student in &event.student_ids {
            let backed = entitlements.iter().any(|e| {
                &e.student_id == student
                    && e.is_paid()
                    && (event.order_ids.is_empty() || event.order_ids.contains(&e.id))
            });
            if backed {
                paid.insert(student.as_str());
            }
        }
    }
    paid.len()
}

/// Patch moving `group` to `to`, if the lifecycle allows it.
pub fn advance_class_group(
    group: &ClassGroup,
    to: ClassGroupStatus,
) -> Result<ClassGroupPatch, TransitionRefusal> {
    if !group.status.can_transition_to(to) {
        return Err(TransitionRefusal::IllegalClassTransition {
            id: group.id.clone(),
            from: group.status,
            to,
        });
    }
    Ok(ClassGroupPatch {
        status: Some(to),
        ..ClassGroupPatch::default()
    })
}

/// Applies workflow rules on top of a [`ScheduleEventStore`].
pub struct ScheduleWorkflow {
    store: Arc<ScheduleEventStore>,
    audit: Option<Arc<Mutex<Box<dyn AuditSink>>>>,
}

impl ScheduleWorkflow {
    /// Workflow over `store`.
    pub const fn new(store: Arc<ScheduleEventStore>) -> Self {
        Self { store, audit: None }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Arc::new(Mutex::new(audit)));
        self
    }

    /// Underlying store.
    pub const fn store(&self) -> &Arc<ScheduleEventStore> {
        &self.store
    }

    fn record_audit(&self, subject: &str, scope: ScheduleType, action: AuditAction, payload: Option<String>) {
        if let Some(audit_sink) = &self.audit {
            let mut sink = audit_sink.lock();
            sink.record(build_audit_event(
                subject,
                scope.as_str(),
                self.store.tenant(),
                action,
                payload,
            ));
        }
    }

    /// Create an event. New events always enter `pending`.
    pub fn create_event(&self, mut draft: NewScheduleEvent) -> ScheduleEvent {
        draft.status = Some(EventStatus::Pending);
        let event = self.store.add_event(draft);
        self.record_audit(&event.id, event.schedule_type, AuditAction::Create, None);
        tracing::info!(event = %event.id, class = ?event.class_id, "event created");
        event
    }

    /// Edit a pending event. Status is never changed by an edit.
    pub fn edit_event(&self, id: &str, patch: &EventPatch) -> Result<ScheduleEvent, TransitionRefusal> {
        let patch = EventPatch {
            status: None,
            ..patch.clone()
        };
        let now = now_utc();
        let result = self
            .store
            .with_event_mut(id, |event| {
                if !event.status.is_editable() {
                    return Err(TransitionRefusal::EventNotEditable {
                        id: event.id.clone(),
                        status: event.status,
                    });
                }
                patch.merge_into(event, now);
                Ok(event.clone())
            })
            .unwrap_or_else(|| Err(TransitionRefusal::EventNotFound(id.to_string())));

        match &result {
            Ok(event) => {
                self.record_audit(&event.id, event.schedule_type, AuditAction::Edit, None);
                tracing::info!(event = %event.id, "event edited");
            }
            Err(refusal) => {
                tracing::warn!(event = %id, %refusal, "edit refused");
            }
        }
        result
    }

    /// Delete an event from any state.
    pub fn delete_event(&self, id: &str) -> Result<ScheduleEvent, TransitionRefusal> {
        let Some(event) = self.store.delete_event(id) else {
            return Err(TransitionRefusal::EventNotFound(id.to_string()));
        };
        self.record_audit(
            &event.id,
            event.schedule_type,
            AuditAction::Delete,
            Some(event.status.to_string()),
        );
        tracing::info!(event = %event.id, status = %event.status, "event deleted");
        Ok(event)
    }

    fn transition(
        events: &mut [ScheduleEvent],
        scope: &ScheduleScope,
        from: EventStatus,
        to: EventStatus,
    ) -> Vec<EventId> {
        let now = now_utc();
        events
            .iter_mut()
            .filter(|e| e.status == from && scope.matches(e))
            .map(|e| {
                e.status = to;
                e.updated_at = now;
                e.id.clone()
            })
            .collect()
    }

    fn outcome(&self, scope: &ScheduleScope, event_ids: Vec<EventId>, to: EventStatus, action: AuditAction) -> TransitionOutcome {
        if event_ids.is_empty() {
            tracing::debug!(scope = ?scope, %action, "nothing to do");
            return TransitionOutcome::NothingToDo;
        }
        for id in &event_ids {
            self.record_audit(id, scope.schedule_type, action, None);
        }
        tracing::info!(count = event_ids.len(), %to, %action, "events transitioned");
        TransitionOutcome::Transitioned { event_ids, to }
    }

    /// Move every pending event in scope to pre-scheduled.
    pub fn pre_schedule(&self, scope: &ScheduleScope) -> TransitionOutcome {
        let moved = self.store.with_partition(scope.schedule_type, |events| {
            Self::transition(events, scope, EventStatus::Pending, EventStatus::PreScheduled)
        });
        self.outcome(scope, moved, EventStatus::PreScheduled, AuditAction::PreSchedule)
    }

    /// Move every pre-scheduled event of `class` in scope to published,
    /// provided enough distinct students on the class's events are paid.
    ///
    /// The gate counts students over every event of the class; the scope's
    /// date range only picks which events move.
    pub fn publish(
        &self,
        scope: &ScheduleScope,
        class: &ClassGroup,
        entitlements: &[Entitlement],
    ) -> Result<TransitionOutcome, TransitionRefusal> {
        if class.schedule_type != scope.schedule_type
            || scope.class_id.as_ref().is_some_and(|id| id != &class.id)
        {
            return Err(TransitionRefusal::ScopeMismatch {
                class_id: class.id.clone(),
            });
        }
        let scope = ScheduleScope {
            class_id: Some(class.id.clone()),
            ..scope.clone()
        };
        let whole_class = ScheduleScope::class(scope.schedule_type, class.id.clone());

        let moved = self.store.with_partition(scope.schedule_type, |events| {
            let paid = paid_student_count(events.iter().filter(|e| whole_class.matches(e)), entitlements);
            let required = class.min_students;
            if u32::try_from(paid).unwrap_or(u32::MAX) < required {
                return Err(TransitionRefusal::PublishGateNotMet { required, paid });
            }
            Ok(Self::transition(events, &scope, EventStatus::PreScheduled, EventStatus::Published))
        });

        match moved {
            Ok(event_ids) => Ok(self.outcome(&scope, event_ids, EventStatus::Published, AuditAction::Publish)),
            Err(refusal) => {
                self.record_audit(&class.id, scope.schedule_type, AuditAction::Refuse, Some(refusal.to_string()));
                tracing::warn!(class = %class.id, %refusal, "publish refused");
                Err(refusal)
            }
        }
    }
}
