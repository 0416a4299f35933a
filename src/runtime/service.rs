//! Orchestration over the collaborators and the workflow.
//!
//! Every call fetches fresh snapshots from the collaborators, runs the pure
//! core computations on them, and only then touches the event store.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::{
    advance_class_group, apply_used_minutes, compute_group_constraints, filter_visible_events,
    match_teacher_availability, AppResult, AuditEvent, AvailabilitySnapshot, ClassGroup,
    ClassGroupPatch, ClassGroupRepository, ClassGroupStatus, ConstraintViolation, DateRange,
    Entitlement, EntitlementResolver, EventFilter, EventPatch, ExclusionSet, ExpiryRuleLookup,
    HolidayProvider, InMemoryAuditSink, NewClassGroup, NewScheduleEvent, OrderSource, ProposalCheck, ScheduleCondition, ScheduleEvent,
    ScheduleEventStore, ScheduleScope, ScheduleType, ScheduleWorkflow, SchedulingError,
    SessionProposal, TeacherOpenTimeSource, TransitionOutcome, TransitionRefusal,
};
use crate::runtime::api::{ArrangementRequest, ArrangementResult, ConstraintReport};
use crate::util::clock::now_utc;
use crate::util::ids::{ClassGroupId, TeacherId};

/// External data sources the service reads from.
#[derive(Clone)]
pub struct Collaborators {
    /// Order/contract records.
    pub orders: Arc<dyn OrderSource>,
    /// Holiday calendar.
    pub holidays: Arc<dyn HolidayProvider>,
    /// Teacher open time and bookings.
    pub teachers: Arc<dyn TeacherOpenTimeSource>,
    /// Class group persistence.
    pub class_groups: Arc<dyn ClassGroupRepository>,
    /// Expiry rules; the configured rule table is used when unset.
    pub expiry_rules: Option<Arc<dyn ExpiryRuleLookup>>,
}

/// Scheduling engine for one tenant.
pub struct SchedulingService {
    config: EngineConfig,
    orders: Arc<dyn OrderSource>,
    holidays: Arc<dyn HolidayProvider>,
    teachers: Arc<dyn TeacherOpenTimeSource>,
    class_groups: Arc<dyn ClassGroupRepository>,
    expiry_rules: Arc<dyn ExpiryRuleLookup>,
    workflow: ScheduleWorkflow,
    audit: Option<InMemoryAuditSink>,
}

impl SchedulingService {
    /// Assemble a service. Prefer [`crate::builders::build_service`].
    pub fn new(
        config: EngineConfig,
        collaborators: Collaborators,
        expiry_rules: Arc<dyn ExpiryRuleLookup>,
        workflow: ScheduleWorkflow,
    ) -> Self {
        Self {
            config,
            orders: collaborators.orders,
            holidays: collaborators.holidays,
            teachers: collaborators.teachers,
            class_groups: collaborators.class_groups,
            expiry_rules,
            workflow,
            audit: None,
        }
    }

    /// Keep a handle on the in-memory trail the workflow records to.
    #[must_use]
    pub fn with_audit_trail(mut self, sink: InMemoryAuditSink) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Recorded audit events, oldest first; empty without a trail.
    pub fn audit_trail(&self) -> Vec<AuditEvent> {
        self.audit.as_ref().map(InMemoryAuditSink::events).unwrap_or_default()
    }

    /// Active configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Event store backing the workflow.
    pub fn store(&self) -> &Arc<ScheduleEventStore> {
        self.workflow.store()
    }

    /// Look up one class group.
    pub async fn find_class_group(
        &self,
        schedule_type: ScheduleType,
        id: &str,
    ) -> AppResult<ClassGroup> {
        self.class_groups
            .fetch_class_groups(schedule_type)
            .await?
            .into_iter()
            .find(|g| g.id == id)
            .ok_or_else(|| SchedulingError::NotFound(format!("class group {id}")).into())
    }

    /// Create a class group in `draft`.
    pub async fn create_class_group(&self, group: NewClassGroup) -> AppResult<ClassGroupId> {
        self.class_groups.create_class_group(group).await
    }

    /// Apply a settings edit. Status only moves through the workflow, so any
    /// status in the patch is dropped.
    pub async fn update_class_group(&self, id: &str, patch: ClassGroupPatch) -> AppResult<()> {
        let patch = ClassGroupPatch {
            status: None,
            ..patch
        };
        self.class_groups.update_class_group(id, patch).await
    }

    /// Remove a class group. Its events are left in the store.
    pub async fn delete_class_group(&self, id: &str) -> AppResult<()> {
        self.class_groups.delete_class_group(id).await?;
        tracing::info!(class = %id, "class group deleted");
        Ok(())
    }

    /// Eligible entitlements for `class`, with minutes already booked in the
    /// store subtracted.
    pub async fn load_entitlements(
        &self,
        class: &ClassGroup,
        condition: &ScheduleCondition,
    ) -> AppResult<Vec<Entitlement>> {
        let orders = self.orders.fetch_orders_by_ids(&class.order_ids).await?;
        let resolver = EntitlementResolver::new(self.expiry_rules.as_ref(), self.config.session_minutes);
        let mut entitlements = resolver.resolve(&orders, class, condition, now_utc());
        apply_used_minutes(&mut entitlements, &self.store().booked_events());
        Ok(entitlements)
    }

    /// Entitlements plus the bounds they impose on `class`.
    pub async fn load_constraints(
        &self,
        class: &ClassGroup,
        condition: &ScheduleCondition,
    ) -> AppResult<ConstraintReport> {
        let entitlements = self.load_entitlements(class, condition).await?;
        let constraints = compute_group_constraints(&entitlements);
        let effective_end_date = constraints.effective_end_date(condition);
        tracing::debug!(
            class = %class.id,
            students = constraints.student_count,
            min_available = constraints.min_available_minutes,
            "constraints loaded"
        );
        Ok(ConstraintReport {
            entitlements,
            constraints,
            effective_end_date,
        })
    }

    /// Excluded days for `condition`. Holidays are only fetched when the
    /// condition asks for them.
    pub async fn load_exclusions(&self, condition: &ScheduleCondition) -> AppResult<ExclusionSet> {
        let holidays = if condition.exclude_holidays {
            self.holidays.fetch_holidays().await?
        } else {
            Vec::new()
        };
        Ok(ExclusionSet::from_condition(condition, &holidays))
    }

    /// Availability snapshot for a teacher selection over the condition's
    /// search range.
    pub async fn load_availability(
        &self,
        teacher_ids: &[TeacherId],
        condition: &ScheduleCondition,
    ) -> AppResult<AvailabilitySnapshot> {
        let range = DateRange::from_condition(condition, self.config.default_search_days);
        let exclusions = self.load_exclusions(condition).await?;
        let open_time = self
            .teachers
            .fetch_teacher_open_time(teacher_ids, range.start, range.end)
            .await?;
        Ok(match_teacher_availability(teacher_ids, &range, &exclusions, &open_time))
    }

    async fn teacher_violations(
        &self,
        proposal: &SessionProposal,
        condition: &ScheduleCondition,
    ) -> AppResult<Vec<ConstraintViolation>> {
        let teachers: Vec<TeacherId> = proposal
            .sessions
            .iter()
            .filter_map(|s| s.teacher_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if teachers.is_empty() {
            return Ok(Vec::new());
        }
        let snapshot = self.load_availability(&teachers, condition).await?;
        Ok(proposal
            .sessions
            .iter()
            .filter(|s| s.start_time < s.end_time)
            .filter_map(|s| {
                let teacher = s.teacher_id.as_deref()?;
                let start = s.date.and_time(s.start_time);
                let end = s.date.and_time(s.end_time);
                (!snapshot.is_bookable(Some(teacher), start, end)).then(|| {
                    ConstraintViolation::TeacherUnavailable {
                        date: s.date,
                        teacher_id: teacher.to_string(),
                    }
                })
            })
            .collect())
    }

    /// Check a batch of sessions and, when every bound holds, create them as
    /// pending events carrying the eligible students and their orders.
    pub async fn arrange_sessions(&self, request: &ArrangementRequest) -> AppResult<ArrangementResult> {
        let class = &request.class_group;
        let condition = &request.condition;
        let report = self.load_constraints(class, condition).await?;
        let exclusions = self.load_exclusions(condition).await?;

        let mut violations = match report
            .constraints
            .check_proposal(&request.proposal, condition, &exclusions)
        {
            ProposalCheck::Accepted { .. } => Vec::new(),
            ProposalCheck::Rejected { violations } => violations,
        };
        violations.extend(self.teacher_violations(&request.proposal, condition).await?);
        if !violations.is_empty() {
            tracing::warn!(class = %class.id, count = violations.len(), "arrangement rejected");
            return Ok(ArrangementResult::Rejected { violations });
        }

        let student_ids: Vec<_> = report
            .entitlements
            .iter()
            .map(|e| e.student_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let order_ids: Vec<_> = report.entitlements.iter().map(|e| e.id.clone()).collect();

        let events = request
            .proposal
            .sessions
            .iter()
            .map(|session| {
                self.workflow.create_event(NewScheduleEvent {
                    id: None,
                    schedule_type: class.schedule_type,
                    class_id: Some(class.id.clone()),
                    date: session.date,
                    start_time: session.start_time,
                    end_time: session.end_time,
                    teacher_id: session.teacher_id.clone(),
                    student_ids: student_ids.clone(),
                    order_ids: order_ids.clone(),
                    campus: class.campus_id.clone(),
                    language: class.language.clone(),
                    status: None,
                    created_by: request.actor.clone(),
                })
            })
            .collect::<Vec<_>>();
        tracing::info!(class = %class.id, count = events.len(), "sessions arranged");
        Ok(ArrangementResult::Booked { events })
    }

    async fn advance(&self, class: &ClassGroup, to: ClassGroupStatus) -> AppResult<()> {
        match advance_class_group(class, to) {
            Ok(patch) => {
                self.class_groups.update_class_group(&class.id, patch).await?;
                tracing::info!(class = %class.id, status = %to, "class group advanced");
            }
            Err(refusal) => tracing::debug!(class = %class.id, %refusal, "class group left as is"),
        }
        Ok(())
    }

    /// Pre-schedule every pending event of `class`, optionally within
    /// `range`, and move the class to `scheduled` when anything moved.
    pub async fn pre_schedule_class(
        &self,
        class: &ClassGroup,
        range: Option<DateRange>,
    ) -> AppResult<TransitionOutcome> {
        let mut scope = ScheduleScope::class(class.schedule_type, class.id.clone());
        scope.date_range = range;
        let outcome = self.workflow.pre_schedule(&scope);
        if outcome.count() > 0 {
            self.advance(class, ClassGroupStatus::Scheduled).await?;
        }
        Ok(outcome)
    }

    /// Publish the pre-scheduled events of `class` if enough students are
    /// paid, and move the class to `published` when anything moved.
    ///
    /// The outer error is a collaborator failure; the inner one is a
    /// workflow refusal that left the state untouched.
    pub async fn publish_class(
        &self,
        class: &ClassGroup,
        condition: &ScheduleCondition,
        range: Option<DateRange>,
    ) -> AppResult<Result<TransitionOutcome, TransitionRefusal>> {
        let entitlements = self.load_entitlements(class, condition).await?;
        let mut scope = ScheduleScope::class(class.schedule_type, class.id.clone());
        scope.date_range = range;
        let result = self.workflow.publish(&scope, class, &entitlements);
        if result.as_ref().is_ok_and(|outcome| outcome.count() > 0) {
            self.advance(class, ClassGroupStatus::Published).await?;
        }
        Ok(result)
    }

    /// Create a single event; it always enters `pending`.
    pub fn create_event(&self, draft: NewScheduleEvent) -> ScheduleEvent {
        self.workflow.create_event(draft)
    }

    /// Edit a pending event.
    pub fn edit_event(&self, id: &str, patch: &EventPatch) -> Result<ScheduleEvent, TransitionRefusal> {
        self.workflow.edit_event(id, patch)
    }

    /// Delete an event in any state.
    pub fn delete_event(&self, id: &str) -> Result<ScheduleEvent, TransitionRefusal> {
        self.workflow.delete_event(id)
    }

    /// Events matching `filter` that a teacher selection should see.
    pub fn visible_events(
        &self,
        schedule_type: ScheduleType,
        filter: &EventFilter,
        teacher_ids: &[TeacherId],
    ) -> Vec<ScheduleEvent> {
        let events = self.store().get_events(schedule_type, filter);
        filter_visible_events(&events, teacher_ids)
            .into_iter()
            .cloned()
            .collect()
    }
}
