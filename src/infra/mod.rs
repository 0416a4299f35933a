//! Infrastructure adapters for the engine's collaborators.

pub mod calendar;
pub mod class_groups;
pub mod expiry_rules;
pub mod orders;

pub use calendar::{InMemoryHolidayProvider, InMemoryTeacherOpenTime};
pub use class_groups::InMemoryClassGroupRepository;
pub use expiry_rules::{NoExpiryRules, RuleTableExpiryLookup};
pub use orders::InMemoryOrderSource;
