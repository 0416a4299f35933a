//! Group constraint calculation and proposal checking.
//!
//! A group class cannot run longer than its most time-constrained member, nor
//! past the earliest expiry among the entitlements backing it. The bounds are
//! advisory: they are checked when a proposal is made, not held as a lock.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::availability::ExclusionSet;
use crate::core::model::{minutes_between, Entitlement, ScheduleCondition};
use crate::util::ids::{StudentId, TeacherId};

/// Binding bounds derived from a class's eligible entitlements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConstraints {
    /// Smallest per-student sum of available minutes; zero with no students.
    pub min_available_minutes: u32,
    /// Earliest non-null expiry; `None` means no upper limit.
    pub earliest_expiry_date: Option<DateTime<Utc>>,
    /// Distinct students holding an eligible entitlement.
    pub student_count: usize,
}

/// Aggregate entitlements into class-wide bounds.
pub fn compute_group_constraints(entitlements: &[Entitlement]) -> GroupConstraints {
    let mut per_student: HashMap<&StudentId, u32> = HashMap::new();
    for entitlement in entitlements {
        let sum = per_student.entry(&entitlement.student_id).or_default();
        *sum = sum.saturating_add(entitlement.available_minutes);
    }

    GroupConstraints {
        min_available_minutes: per_student.values().copied().min().unwrap_or(0),
        earliest_expiry_date: entitlements.iter().filter_map(|e| e.expires_at).min(),
        student_count: per_student.len(),
    }
}

/// One session the operator wants to book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedSession {
    /// Session date.
    pub date: NaiveDate,
    /// Start time.
    pub start_time: NaiveTime,
    /// End time.
    pub end_time: NaiveTime,
    /// Teacher, if chosen.
    pub teacher_id: Option<TeacherId>,
}

impl ProposedSession {
    /// Length in minutes; zero when the range is inverted.
    pub fn duration_minutes(&self) -> u32 {
        minutes_between(self.start_time, self.end_time)
    }
}

/// A batch of sessions checked together against the bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProposal {
    /// Sessions in the batch.
    pub sessions: Vec<ProposedSession>,
}

impl SessionProposal {
    /// Total minutes across the batch.
    pub fn total_minutes(&self) -> u32 {
        self.sessions
            .iter()
            .map(ProposedSession::duration_minutes)
            .fold(0, u32::saturating_add)
    }
}

/// Reason a proposal was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConstraintViolation {
    /// Nothing to book.
    #[error("proposal contains no sessions")]
    EmptyProposal,
    /// End is not after start.
    #[error("session on {date} ends before it starts")]
    InvalidTimeRange {
        /// Offending date.
        date: NaiveDate,
    },
    /// Batch needs more minutes than the tightest student has left.
    #[error("proposal needs {requested} minutes but only {available} are available")]
    ExceedsAvailableMinutes {
        /// Minutes requested.
        requested: u32,
        /// Minutes available.
        available: u32,
    },
    /// Session ends after an entitlement expires.
    #[error("session on {date} falls after the earliest entitlement expiry {expiry}")]
    AfterEarliestExpiry {
        /// Offending date.
        date: NaiveDate,
        /// Earliest expiry date.
        expiry: NaiveDate,
    },
    /// Session precedes the scheduling window.
    #[error("session on {date} is before the schedule start {start}")]
    BeforeStart {
        /// Offending date.
        date: NaiveDate,
        /// Window start.
        start: NaiveDate,
    },
    /// Session follows the scheduling window.
    #[error("session on {date} is after the schedule end {end}")]
    AfterEnd {
        /// Offending date.
        date: NaiveDate,
        /// Window end.
        end: NaiveDate,
    },
    /// Session lands on an excluded day.
    #[error("session on {date} falls on an excluded date")]
    ExcludedDate {
        /// Offending date.
        date: NaiveDate,
    },
    /// Chosen teacher has no free open time for the session.
    #[error("teacher {teacher_id} is not available on {date}")]
    TeacherUnavailable {
        /// Offending date.
        date: NaiveDate,
        /// Requested teacher.
        teacher_id: TeacherId,
    },
}

/// Verdict on a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProposalCheck {
    /// Every bound holds.
    Accepted {
        /// Minutes the batch will consume.
        total_minutes: u32,
    },
    /// At least one bound is broken.
    Rejected {
        /// Every violation found, in session order.
        violations: Vec<ConstraintViolation>,
    },
}

impl ProposalCheck {
    /// Whether the proposal may be booked.
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Human-readable reasons, empty when accepted.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            Self::Accepted { .. } => Vec::new(),
            Self::Rejected { violations } => violations.iter().map(ToString::to_string).collect(),
        }
    }
}

impl GroupConstraints {
    /// Latest day a session may be placed on: the earlier of the condition
    /// end and the earliest expiry.
    pub fn effective_end_date(&self, condition: &ScheduleCondition) -> Option<NaiveDate> {
        let expiry = self.earliest_expiry_date.map(|at| at.date_naive());
        match (condition.end_date, expiry) {
            (Some(end), Some(expiry)) => Some(end.min(expiry)),
            (end, expiry) => end.or(expiry),
        }
    }

    /// Check a proposal against the bounds, the condition window and the
    /// excluded days.
    pub fn check_proposal(
        &self,
        proposal: &SessionProposal,
        condition: &ScheduleCondition,
        exclusions: &ExclusionSet,
    ) -> ProposalCheck {
        if proposal.sessions.is_empty() {
            return ProposalCheck::Rejected {
                violations: vec![ConstraintViolation::EmptyProposal],
            };
        }

        let mut violations = Vec::new();
        for session in &proposal.sessions {
            let date = session.date;
            if session.end_time <= session.start_time {
                violations.push(ConstraintViolation::InvalidTimeRange { date });
            }
            if date < condition.start_date {
                violations.push(ConstraintViolation::BeforeStart {
                    date,
                    start: condition.start_date,
                });
            }
            if let Some(end) = condition.end_date {
                if date > end {
                    violations.push(ConstraintViolation::AfterEnd { date, end });
                }
            }
            if let Some(expiry) = self.earliest_expiry_date {
                if date.and_time(session.end_time).and_utc() > expiry {
                    violations.push(ConstraintViolation::AfterEarliestExpiry {
                        date,
                        expiry: expiry.date_naive(),
                    });
                }
            }
            if exclusions.contains(date) {
                violations.push(ConstraintViolation::ExcludedDate { date });
            }
        }

        let requested = proposal.total_minutes();
        if requested > self.min_available_minutes {
            violations.push(ConstraintViolation::ExceedsAvailableMinutes {
                requested,
                available: self.min_available_minutes,
            });
        }

        if violations.is_empty() {
            ProposalCheck::Accepted {
                total_minutes: requested,
            }
        } else {
            tracing::warn!(count = violations.len(), "proposal rejected");
            ProposalCheck::Rejected { violations }
        }
    }
}
