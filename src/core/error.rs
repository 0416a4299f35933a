//! Error types for scheduling operations.

use thiserror::Error;

/// Errors produced by engine components.
///
/// Ineligible orders, constraint violations and illegal transitions are not
/// errors; they are reported through their own result types.
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Class group violates its size invariants.
    #[error("invalid class group: {0}")]
    InvalidClassGroup(String),
    /// Referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
