//! Orchestration service, arrangement sessions and API surface.

pub mod api;
pub mod service;
pub mod session;

pub use api::{health, ArrangementRequest, ArrangementResult, ConstraintReport, Health};
pub use service::{Collaborators, SchedulingService};
pub use session::ArrangementSession;
