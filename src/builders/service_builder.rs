//! Assemble a scheduling service from configuration and collaborators.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::{ExpiryRuleLookup, InMemoryAuditSink, ScheduleEventStore, ScheduleWorkflow, SchedulingError};
use crate::infra::RuleTableExpiryLookup;
use crate::runtime::{Collaborators, SchedulingService};

/// Build a service for `cfg.tenant` over the given collaborators.
///
/// The workflow records to an in-memory audit buffer of `cfg.audit_buffer`
/// entries. When no expiry lookup is supplied, the configured rule table is
/// used.
pub fn build_service(
    cfg: EngineConfig,
    collaborators: Collaborators,
) -> Result<SchedulingService, SchedulingError> {
    cfg.validate()
        .map_err(|e| SchedulingError::InvalidConfig(format!("config invalid: {e}")))?;

    let expiry_rules: Arc<dyn ExpiryRuleLookup> = match &collaborators.expiry_rules {
        Some(rules) => Arc::clone(rules),
        None => Arc::new(RuleTableExpiryLookup::new(cfg.expiry_rules.clone())),
    };
    let store = Arc::new(ScheduleEventStore::new(cfg.tenant.clone()));
    let audit = InMemoryAuditSink::new(cfg.audit_buffer);
    let workflow = ScheduleWorkflow::new(store).with_audit(Box::new(audit.clone()));

    tracing::info!(
        tenant = %cfg.tenant,
        session_minutes = cfg.session_minutes,
        rules = cfg.expiry_rules.len(),
        "scheduling service built"
    );
    Ok(SchedulingService::new(cfg, collaborators, expiry_rules, workflow).with_audit_trail(audit))
}
