//! Configuration models for the engine and its expiry rule table.

pub mod engine;

pub use engine::{EngineConfig, ExpiryRuleConfig};
