//! Domain records shared by the resolver, calculator, matcher and store.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::SchedulingError;
use crate::util::ids::{ClassGroupId, EventId, OrderId, StudentId, TeacherId};

/// Scheduling partition a class or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    /// One student, one teacher.
    Personal,
    /// Small group class.
    Group,
    /// Term-long class.
    Semester,
}

impl ScheduleType {
    /// All partitions, in a stable order.
    pub const ALL: [Self; 3] = [Self::Personal, Self::Group, Self::Semester];

    /// Wire name used in order line-item options.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Group => "group",
            Self::Semester => "semester",
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScheduleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(Self::Personal),
            "group" => Ok(Self::Group),
            "semester" => Ok(Self::Semester),
            _ => Err(format!("invalid schedule type: {s}")),
        }
    }
}

/// Lifecycle of a class group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassGroupStatus {
    /// Created, nothing arranged yet.
    Draft,
    /// Sessions pre-scheduled.
    Scheduled,
    /// Sessions visible to students.
    Published,
    /// Retired; terminal.
    Archived,
}

impl ClassGroupStatus {
    const fn rank(self) -> u8 {
        match self {
            Self::Draft => 0,
            Self::Scheduled => 1,
            Self::Published => 2,
            Self::Archived => 3,
        }
    }

    /// Check if this is the terminal state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Archived)
    }

    /// Forward moves only. Archiving is allowed from any live state; staying
    /// put is not a transition.
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Archived => true,
            _ => next.rank() == self.rank() + 1,
        }
    }
}

impl fmt::Display for ClassGroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::Published => write!(f, "published"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

/// A teachable unit with size and campus/language constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGroup {
    /// Identifier.
    pub id: ClassGroupId,
    /// Display name.
    pub name: String,
    /// Partition.
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,
    /// Campus restriction, if any.
    pub campus_id: Option<String>,
    /// Teaching language, if any.
    pub language: Option<String>,
    /// Publish gate threshold.
    pub min_students: u32,
    /// Seat limit.
    pub max_students: u32,
    /// Material names attached to the class.
    #[serde(default)]
    pub materials: Vec<String>,
    /// Lifecycle status.
    pub status: ClassGroupStatus,
    /// Entitlements attached to the class.
    #[serde(default)]
    pub order_ids: Vec<OrderId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl ClassGroup {
    /// Enforce `1 <= max_students` and `min_students <= max_students`.
    pub fn validate(&self) -> Result<(), SchedulingError> {
        if self.max_students < 1 {
            return Err(SchedulingError::InvalidClassGroup(format!(
                "class `{}`: max_students must be at least 1",
                self.id
            )));
        }
        if self.min_students > self.max_students {
            return Err(SchedulingError::InvalidClassGroup(format!(
                "class `{}`: min_students {} exceeds max_students {}",
                self.id, self.min_students, self.max_students
            )));
        }
        Ok(())
    }
}

/// Fields accepted when creating a class group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClassGroup {
    /// Display name.
    pub name: String,
    /// Partition.
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,
    /// Campus restriction.
    pub campus_id: Option<String>,
    /// Teaching language.
    pub language: Option<String>,
    /// Publish gate threshold.
    pub min_students: u32,
    /// Seat limit.
    pub max_students: u32,
    /// Materials.
    #[serde(default)]
    pub materials: Vec<String>,
    /// Attached entitlements.
    #[serde(default)]
    pub order_ids: Vec<OrderId>,
}

/// Settings edit for a class group. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGroupPatch {
    /// New name.
    pub name: Option<String>,
    /// New campus; `Some(None)` clears it.
    pub campus_id: Option<Option<String>>,
    /// New language; `Some(None)` clears it.
    pub language: Option<Option<String>>,
    /// New minimum.
    pub min_students: Option<u32>,
    /// New maximum.
    pub max_students: Option<u32>,
    /// Replacement materials list.
    pub materials: Option<Vec<String>>,
    /// New status.
    pub status: Option<ClassGroupStatus>,
    /// Replacement entitlement list.
    pub order_ids: Option<Vec<OrderId>>,
}

impl ClassGroupPatch {
    /// Merge into `group`, returning the merged copy.
    pub fn apply(&self, group: &ClassGroup, now: DateTime<Utc>) -> ClassGroup {
        let mut merged = group.clone();
        if let Some(name) = &self.name {
            merged.name.clone_from(name);
        }
        if let Some(campus) = &self.campus_id {
            merged.campus_id.clone_from(campus);
        }
        if let Some(language) = &self.language {
            merged.language.clone_from(language);
        }
        if let Some(min) = self.min_students {
            merged.min_students = min;
        }
        if let Some(max) = self.max_students {
            merged.max_students = max;
        }
        if let Some(materials) = &self.materials {
            merged.materials.clone_from(materials);
        }
        if let Some(status) = self.status {
            merged.status = status;
        }
        if let Some(order_ids) = &self.order_ids {
            merged.order_ids.clone_from(order_ids);
        }
        merged.updated_at = now;
        merged
    }
}

/// Order status as the engine understands it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Paid in full.
    Success,
    /// Any status text containing `EXPIRED`.
    Expired,
    /// Everything else (pending payment, refunded, ...), kept verbatim.
    Other(String),
}

impl OrderStatus {
    /// Classify raw status text.
    pub fn from_raw(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        if upper.contains("EXPIRED") {
            Self::Expired
        } else if upper == "SUCCESS" {
            Self::Success
        } else {
            Self::Other(raw.to_string())
        }
    }
}

/// A resolved, eligible right to attend sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    /// Backing order id.
    pub id: OrderId,
    /// Holder.
    pub student_id: StudentId,
    /// Language of the backing line item.
    pub language: Option<String>,
    /// Purchased minutes.
    pub total_minutes: u32,
    /// Minutes already booked on scheduled events.
    pub used_minutes: u32,
    /// `total_minutes - used_minutes`, floored at zero.
    pub available_minutes: u32,
    /// Purchased session count.
    pub session_count: u32,
    /// Order creation time.
    pub created_at: DateTime<Utc>,
    /// Rule-derived or line-item expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Order status.
    pub status: OrderStatus,
    /// Effective campus.
    pub campus: Option<String>,
    /// Whether the line item backing this entitlement is paid.
    pub line_item_paid: bool,
}

impl Entitlement {
    /// Record `used` minutes, keeping `available_minutes` consistent.
    pub fn set_used_minutes(&mut self, used: u32) {
        self.used_minutes = used;
        self.available_minutes = self.total_minutes.saturating_sub(used);
    }

    /// Paid means the order succeeded and its backing line item is paid.
    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Success && self.line_item_paid
    }
}

/// Status of a single scheduled session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    /// Editable draft.
    Pending,
    /// Tentative; locked for editing.
    PreScheduled,
    /// Visible to students.
    Published,
}

impl EventStatus {
    /// Only pending events accept edits.
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The single forward successor, if any.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::PreScheduled),
            Self::PreScheduled => Some(Self::Published),
            Self::Published => None,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::PreScheduled => write!(f, "pre-scheduled"),
            Self::Published => write!(f, "published"),
        }
    }
}

/// Who performed a store mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Actor {
    /// Operator id.
    pub id: String,
    /// Operator email.
    pub email: Option<String>,
}

impl Actor {
    /// Build an actor from id and email.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
        }
    }
}

/// One concrete scheduled session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    /// Identifier.
    pub id: EventId,
    /// Partition.
    pub schedule_type: ScheduleType,
    /// Owning class; unset for personal sessions.
    pub class_id: Option<ClassGroupId>,
    /// Session date.
    pub date: NaiveDate,
    /// Start of session.
    pub start_time: NaiveTime,
    /// End of session.
    pub end_time: NaiveTime,
    /// Assigned teacher.
    pub teacher_id: Option<TeacherId>,
    /// Attending students.
    pub student_ids: Vec<StudentId>,
    /// Entitlements consumed.
    pub order_ids: Vec<OrderId>,
    /// Campus.
    pub campus: Option<String>,
    /// Language.
    pub language: Option<String>,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Creator.
    pub created_by: Actor,
    /// Last editor.
    pub updated_by: Actor,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl ScheduleEvent {
    /// Session length in whole minutes; zero when the end precedes the start.
    pub fn duration_minutes(&self) -> u32 {
        minutes_between(self.start_time, self.end_time)
    }

    /// Start as a naive timestamp.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    /// End as a naive timestamp.
    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }
}

pub(crate) fn minutes_between(start: NaiveTime, end: NaiveTime) -> u32 {
    u32::try_from((end - start).num_minutes()).unwrap_or(0)
}

/// Caller-supplied fields for a new event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScheduleEvent {
    /// Pre-assigned id; minted when absent.
    pub id: Option<EventId>,
    /// Partition.
    pub schedule_type: ScheduleType,
    /// Owning class.
    pub class_id: Option<ClassGroupId>,
    /// Session date.
    pub date: NaiveDate,
    /// Start of session.
    pub start_time: NaiveTime,
    /// End of session.
    pub end_time: NaiveTime,
    /// Assigned teacher.
    pub teacher_id: Option<TeacherId>,
    /// Attending students.
    #[serde(default)]
    pub student_ids: Vec<StudentId>,
    /// Entitlements consumed.
    #[serde(default)]
    pub order_ids: Vec<OrderId>,
    /// Campus.
    pub campus: Option<String>,
    /// Language.
    pub language: Option<String>,
    /// Initial status; defaults to pending.
    pub status: Option<EventStatus>,
    /// Creator.
    #[serde(default)]
    pub created_by: Actor,
}

/// Partial update for an event. Absent fields are preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    /// New date.
    pub date: Option<NaiveDate>,
    /// New start.
    pub start_time: Option<NaiveTime>,
    /// New end.
    pub end_time: Option<NaiveTime>,
    /// New teacher; `Some(None)` unassigns.
    pub teacher_id: Option<Option<TeacherId>>,
    /// Replacement student list.
    pub student_ids: Option<Vec<StudentId>>,
    /// Replacement order list.
    pub order_ids: Option<Vec<OrderId>>,
    /// New campus.
    pub campus: Option<Option<String>>,
    /// New language.
    pub language: Option<Option<String>>,
    /// New status. The workflow never sets this on edits.
    pub status: Option<EventStatus>,
    /// Editor.
    pub updated_by: Option<Actor>,
}

impl EventPatch {
    /// Patch that only moves status.
    pub fn status(status: EventStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Merge into `event` in place.
    pub fn merge_into(&self, event: &mut ScheduleEvent, now: DateTime<Utc>) {
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(start) = self.start_time {
            event.start_time = start;
        }
        if let Some(end) = self.end_time {
            event.end_time = end;
        }
        if let Some(teacher) = &self.teacher_id {
            event.teacher_id.clone_from(teacher);
        }
        if let Some(students) = &self.student_ids {
            event.student_ids.clone_from(students);
        }
        if let Some(orders) = &self.order_ids {
            event.order_ids.clone_from(orders);
        }
        if let Some(campus) = &self.campus {
            event.campus.clone_from(campus);
        }
        if let Some(language) = &self.language {
            event.language.clone_from(language);
        }
        if let Some(status) = self.status {
            event.status = status;
        }
        if let Some(actor) = &self.updated_by {
            event.updated_by = actor.clone();
        }
        event.updated_at = now;
    }
}

/// User-chosen scheduling envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCondition {
    /// First schedulable day.
    pub start_date: NaiveDate,
    /// Last schedulable day, if bounded.
    pub end_date: Option<NaiveDate>,
    /// Manually excluded days.
    #[serde(default)]
    pub excluded_dates: BTreeSet<NaiveDate>,
    /// Whether provider holidays are excluded.
    #[serde(default)]
    pub exclude_holidays: bool,
}

impl ScheduleCondition {
    /// Unbounded condition starting on `start_date`.
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date: None,
            excluded_dates: BTreeSet::new(),
            exclude_holidays: false,
        }
    }
}

/// Availability window annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Bookable.
    Open,
    /// Conflicting.
    Busy,
}

/// Contiguous interval of teacher time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAvailabilityWindow {
    /// Owning teacher; unset means "any teacher".
    pub teacher_id: Option<TeacherId>,
    /// Inclusive start.
    pub start: NaiveDateTime,
    /// Exclusive end.
    pub end: NaiveDateTime,
    /// Open or busy.
    pub kind: WindowKind,
}

impl TeacherAvailabilityWindow {
    /// Half-open overlap test.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start < end && start < self.end
    }

    /// Whether `[start, end)` lies inside this window.
    pub fn contains(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start <= start && end <= self.end
    }
}

/// A calendar day supplied by the holiday provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// The excluded day.
    pub date: NaiveDate,
}
