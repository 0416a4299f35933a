//! Authoritative in-memory collection of schedule events.
//!
//! One store per tenant, shared by reference. Each schedule-type partition is
//! guarded by its own `parking_lot::Mutex`, so bulk transitions on one
//! partition never interleave with writes to it, while partitions stay
//! independent of each other.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::availability::DateRange;
use crate::core::model::{EventPatch, EventStatus, NewScheduleEvent, ScheduleEvent, ScheduleType};
use crate::util::clock::now_utc;
use crate::util::ids::{new_event_id, ClassGroupId, EventId, TeacherId};

/// Query over one partition. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    /// Only events of this class.
    pub class_id: Option<ClassGroupId>,
    /// Only events dated inside this range.
    pub date_range: Option<DateRange>,
    /// Only events in this status.
    pub status: Option<EventStatus>,
    /// Only unassigned events or events taught by one of these teachers.
    pub teacher_ids: Option<Vec<TeacherId>>,
}

impl EventFilter {
    /// Restrict to one class.
    #[must_use]
    pub fn for_class(mut self, class_id: impl Into<ClassGroupId>) -> Self {
        self.class_id = Some(class_id.into());
        self
    }

    /// Restrict to a date range.
    #[must_use]
    pub const fn within(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Restrict to a status.
    #[must_use]
    pub const fn with_status(mut self, status: EventStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to a teacher selection.
    #[must_use]
    pub fn for_teachers(mut self, teacher_ids: Vec<TeacherId>) -> Self {
        self.teacher_ids = Some(teacher_ids);
        self
    }

    /// Whether `event` passes the filter.
    pub fn matches(&self, event: &ScheduleEvent) -> bool {
        if let Some(class_id) = &self.class_id {
            if event.class_id.as_ref() != Some(class_id) {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            if !range.contains(event.date) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if event.status != status {
                return false;
            }
        }
        if let (Some(selected), Some(teacher)) = (&self.teacher_ids, &event.teacher_id) {
            if !selected.contains(teacher) {
                return false;
            }
        }
        true
    }
}

/// Tenant-scoped event store.
pub struct ScheduleEventStore {
    tenant: String,
    personal: Mutex<Vec<ScheduleEvent>>,
    group: Mutex<Vec<ScheduleEvent>>,
    semester: Mutex<Vec<ScheduleEvent>>,
}

impl ScheduleEventStore {
    /// Create an empty store for `tenant`.
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            personal: Mutex::new(Vec::new()),
            group: Mutex::new(Vec::new()),
            semester: Mutex::new(Vec::new()),
        }
    }

    /// Tenant this store belongs to.
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    const fn partition(&self, schedule_type: ScheduleType) -> &Mutex<Vec<ScheduleEvent>> {
        match schedule_type {
            ScheduleType::Personal => &self.personal,
            ScheduleType::Group => &self.group,
            ScheduleType::Semester => &self.semester,
        }
    }

    /// Run `f` with exclusive access to one partition.
    pub(crate) fn with_partition<R>(
        &self,
        schedule_type: ScheduleType,
        f: impl FnOnce(&mut Vec<ScheduleEvent>) -> R,
    ) -> R {
        let mut events = self.partition(schedule_type).lock();
        f(&mut events)
    }

    /// Run `f` on the event with `id` while its partition is locked.
    pub(crate) fn with_event_mut<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut ScheduleEvent) -> R,
    ) -> Option<R> {
        for schedule_type in ScheduleType::ALL {
            let mut events = self.partition(schedule_type).lock();
            if let Some(event) = events.iter_mut().find(|e| e.id == id) {
                return Some(f(event));
            }
        }
        None
    }

    /// Append a new event, minting an id when absent. Status defaults to
    /// pending.
    pub fn add_event(&self, draft: NewScheduleEvent) -> ScheduleEvent {
        let now = now_utc();
        let schedule_type = draft.schedule_type;
        self.with_partition(schedule_type, |events| {
            let id = match draft.id {
                Some(id) if events.iter().any(|e| e.id == id) => {
                    let fresh = new_event_id();
                    tracing::warn!(requested = %id, assigned = %fresh, "event id already taken");
                    fresh
                }
                Some(id) => id,
                None => new_event_id(),
            };
            let event = ScheduleEvent {
                id,
                schedule_type,
                class_id: draft.class_id,
                date: draft.date,
                start_time: draft.start_time,
                end_time: draft.end_time,
                teacher_id: draft.teacher_id,
                student_ids: draft.student_ids,
                order_ids: draft.order_ids,
                campus: draft.campus,
                language: draft.language,
                status: draft.status.unwrap_or(EventStatus::Pending),
                updated_by: draft.created_by.clone(),
                created_by: draft.created_by,
                created_at: now,
                updated_at: now,
            };
            tracing::debug!(tenant = %self.tenant, event = %event.id, %schedule_type, "event added");
            events.push(event.clone());
            event
        })
    }

    /// Merge `patch` into the event with `id`. Unknown ids are a silent
    /// no-op; the return value says whether anything was touched.
    pub fn update_event(&self, id: &str, patch: &EventPatch) -> bool {
        let now = now_utc();
        self.with_event_mut(id, |event| patch.merge_into(event, now))
            .is_some()
    }

    /// Remove the event with `id` regardless of its status.
    pub fn delete_event(&self, id: &str) -> Option<ScheduleEvent> {
        for schedule_type in ScheduleType::ALL {
            let mut events = self.partition(schedule_type).lock();
            if let Some(index) = events.iter().position(|e| e.id == id) {
                tracing::debug!(tenant = %self.tenant, event = %id, "event deleted");
                return Some(events.remove(index));
            }
        }
        None
    }

    /// Snapshot of one event.
    pub fn get_event(&self, id: &str) -> Option<ScheduleEvent> {
        self.with_event_mut(id, |event| event.clone())
    }

    /// Filtered snapshot of one partition, ordered by date and start time.
    pub fn get_events(&self, schedule_type: ScheduleType, filter: &EventFilter) -> Vec<ScheduleEvent> {
        let mut out: Vec<ScheduleEvent> = self.with_partition(schedule_type, |events| {
            events.iter().filter(|e| filter.matches(e)).cloned().collect()
        });
        out.sort_by_key(ScheduleEvent::starts_at);
        out
    }

    /// Every event that consumes entitlement minutes, across all partitions,
    /// ordered by date and start time.
    pub fn booked_events(&self) -> Vec<ScheduleEvent> {
        let mut out: Vec<ScheduleEvent> = ScheduleType::ALL
            .iter()
            .flat_map(|t| {
                self.with_partition(*t, |events| {
                    events.iter().filter(|e| !e.order_ids.is_empty()).cloned().collect::<Vec<_>>()
                })
            })
            .collect();
        out.sort_by_key(ScheduleEvent::starts_at);
        out
    }

    /// Events across all partitions.
    pub fn len(&self) -> usize {
        ScheduleType::ALL
            .iter()
            .map(|t| self.partition(*t).lock().len())
            .sum()
    }

    /// Whether the store holds no events.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
