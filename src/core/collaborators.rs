//! Contracts for the data sources the engine consumes.
//!
//! Fetching is done before any core computation runs; the core only ever
//! sees snapshots. Failures from these sources are propagated unchanged.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entitlement::OrderRecord;
use crate::core::model::{
    ClassGroup, ClassGroupPatch, Holiday, NewClassGroup, ScheduleType, TeacherAvailabilityWindow,
};
use crate::core::AppResult;
use crate::util::ids::{ClassGroupId, OrderId, TeacherId};

/// Raw availability fetched for a set of teachers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherOpenTime {
    /// Declared open-time windows.
    pub events: Vec<TeacherAvailabilityWindow>,
    /// Pre-existing conflicting bookings.
    pub busy_events: Vec<TeacherAvailabilityWindow>,
}

/// Expiry rules configured per language and class count.
pub trait ExpiryRuleLookup: Send + Sync {
    /// Expiry for an entitlement of `session_count` sessions in `language`,
    /// counted from `reference_date`. `None` when no rule applies.
    fn calculate_expiry_date(
        &self,
        language: Option<&str>,
        session_count: u32,
        reference_date: NaiveDate,
    ) -> Option<DateTime<Utc>>;
}

/// Source of raw order/contract records.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Fetch the orders with the given ids. Unknown ids are skipped.
    async fn fetch_orders_by_ids(&self, ids: &[OrderId]) -> AppResult<Vec<OrderRecord>>;
}

/// Source of holiday dates.
#[async_trait]
pub trait HolidayProvider: Send + Sync {
    /// All known holidays.
    async fn fetch_holidays(&self) -> AppResult<Vec<Holiday>>;
}

/// Source of teacher open time and bookings.
#[async_trait]
pub trait TeacherOpenTimeSource: Send + Sync {
    /// Windows for `teacher_ids` between `start` and `end` inclusive.
    async fn fetch_teacher_open_time(
        &self,
        teacher_ids: &[TeacherId],
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<TeacherOpenTime>;
}

/// Class group persistence.
#[async_trait]
pub trait ClassGroupRepository: Send + Sync {
    /// All class groups of a partition.
    async fn fetch_class_groups(&self, schedule_type: ScheduleType) -> AppResult<Vec<ClassGroup>>;
    /// Persist a new class group in `draft`, returning its id.
    async fn create_class_group(&self, group: NewClassGroup) -> AppResult<ClassGroupId>;
    /// Merge a settings edit.
    async fn update_class_group(&self, id: &str, patch: ClassGroupPatch) -> AppResult<()>;
    /// Remove a class group.
    async fn delete_class_group(&self, id: &str) -> AppResult<()>;
}
