//! API-facing request/response models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{
    Actor, ClassGroup, ConstraintViolation, Entitlement, GroupConstraints, ScheduleCondition,
    ScheduleEvent, SessionProposal,
};

/// Eligible entitlements and the bounds they impose.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintReport {
    /// Eligible entitlements with booked usage applied.
    pub entitlements: Vec<Entitlement>,
    /// Class-wide bounds.
    pub constraints: GroupConstraints,
    /// Latest day a session may be placed on, if bounded.
    pub effective_end_date: Option<NaiveDate>,
}

impl ConstraintReport {
    /// Distinct eligible students; zero is a valid business state.
    pub const fn eligible_students(&self) -> usize {
        self.constraints.student_count
    }
}

/// Request to book a batch of sessions for a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrangementRequest {
    /// Class being arranged.
    pub class_group: ClassGroup,
    /// Scheduling envelope.
    pub condition: ScheduleCondition,
    /// Sessions to book.
    pub proposal: SessionProposal,
    /// Operator.
    pub actor: Actor,
}

/// Outcome of an arrangement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ArrangementResult {
    /// Events were created in `pending`.
    Booked {
        /// Created events.
        events: Vec<ScheduleEvent>,
    },
    /// Nothing was created.
    Rejected {
        /// Every reason found.
        violations: Vec<ConstraintViolation>,
    },
}

impl ArrangementResult {
    /// Human-readable rejection reasons, empty when booked.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            Self::Booked { .. } => Vec::new(),
            Self::Rejected { violations } => violations.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Tenant served.
    pub tenant: String,
    /// Events held in the store.
    pub events: usize,
}

/// Return a health payload for `service`.
pub fn health(service: &crate::runtime::SchedulingService) -> Health {
    Health {
        ok: true,
        tenant: service.store().tenant().to_string(),
        events: service.store().len(),
    }
}
