//! Operator-side arrangement state.

use crate::core::{
    Actor, ClassGroup, ClassGroupPatch, DateRange, ProposedSession, ScheduleCondition,
    SessionProposal,
};
use crate::runtime::api::ArrangementRequest;
use crate::util::clock::now_utc;
use crate::util::ids::TeacherId;

/// What an operator has picked so far while arranging one class.
///
/// Teacher picks only make sense for a given campus and language, so
/// changing either clears them.
#[derive(Debug, Clone)]
pub struct ArrangementSession {
    class_group: ClassGroup,
    condition: ScheduleCondition,
    selected_teachers: Vec<TeacherId>,
}

impl ArrangementSession {
    /// Start arranging `class_group` under `condition`.
    pub const fn new(class_group: ClassGroup, condition: ScheduleCondition) -> Self {
        Self {
            class_group,
            condition,
            selected_teachers: Vec::new(),
        }
    }

    /// Class being arranged.
    pub const fn class_group(&self) -> &ClassGroup {
        &self.class_group
    }

    /// Current condition.
    pub const fn condition(&self) -> &ScheduleCondition {
        &self.condition
    }

    /// Teachers currently selected.
    pub fn selected_teachers(&self) -> &[TeacherId] {
        &self.selected_teachers
    }

    /// Replace the teacher selection. Duplicates are dropped.
    pub fn select_teachers(&mut self, teacher_ids: impl IntoIterator<Item = TeacherId>) {
        self.selected_teachers.clear();
        for id in teacher_ids {
            if !self.selected_teachers.contains(&id) {
                self.selected_teachers.push(id);
            }
        }
    }

    /// Replace the condition.
    pub fn set_condition(&mut self, condition: ScheduleCondition) {
        self.condition = condition;
    }

    /// Apply a settings edit locally. Any status in the patch is dropped.
    /// Returns `true` when the teacher selection was reset.
    pub fn apply_settings(&mut self, patch: &ClassGroupPatch) -> bool {
        let patch = ClassGroupPatch {
            status: None,
            ..patch.clone()
        };
        let updated = patch.apply(&self.class_group, now_utc());
        let reset = updated.campus_id != self.class_group.campus_id
            || updated.language != self.class_group.language;
        if reset && !self.selected_teachers.is_empty() {
            tracing::debug!(class = %updated.id, "campus or language changed, teachers reset");
            self.selected_teachers.clear();
        }
        self.class_group = updated;
        reset
    }

    /// Range availability is searched over.
    pub fn search_range(&self, default_days: u64) -> DateRange {
        DateRange::from_condition(&self.condition, default_days)
    }

    /// Build a booking request from the picked sessions.
    pub fn to_request(&self, sessions: Vec<ProposedSession>, actor: Actor) -> ArrangementRequest {
        ArrangementRequest {
            class_group: self.class_group.clone(),
            condition: self.condition.clone(),
            proposal: SessionProposal { sessions },
            actor,
        }
    }
}
