//! Audit trail for workflow mutations.
//!
//! Every create, edit, delete, bulk transition and refusal goes through an
//! [`AuditSink`]. Persisting the trail is left to whoever implements the
//! trait outside this crate.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;

/// What happened to the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Event created.
    Create,
    /// Pending event edited.
    Edit,
    /// Event deleted.
    Delete,
    /// Event moved to pre-scheduled.
    PreSchedule,
    /// Event moved to published.
    Publish,
    /// Transition refused; nothing changed.
    Refuse,
}

impl AuditAction {
    /// Stable wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::PreSchedule => "pre_schedule",
            Self::Publish => "publish",
            Self::Refuse => "refuse",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Record identifier.
    pub event_id: String,
    /// Affected schedule event or class group.
    pub subject_id: String,
    /// Schedule partition the action ran in.
    pub scope: String,
    /// Tenant identifier.
    pub tenant: String,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context, such as a refusal reason.
    pub payload: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Bounded in-memory trail. Clones share the same buffer, so a handle kept
/// by the caller sees what the workflow records.
#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Sink keeping the latest `max_events` records; zero keeps nothing.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events))),
            max_events,
        }
    }

    /// Snapshot of stored records, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Records about one event or class group.
    pub fn events_for(&self, subject_id: &str) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    subject_id: impl Into<String>,
    scope: impl Into<String>,
    tenant: impl Into<String>,
    action: AuditAction,
    payload: Option<String>,
) -> AuditEvent {
    let subject_id = subject_id.into();
    AuditEvent {
        event_id: format!("{subject_id}-{action}-{}", uuid::Uuid::new_v4()),
        subject_id,
        scope: scope.into(),
        tenant: tenant.into(),
        action,
        created_at_ms: now_ms(),
        payload,
    }
}
