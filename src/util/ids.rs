//! Identifier aliases shared across the engine.
//!
//! Everything except event ids is minted by the surrounding system and arrives
//! as an opaque string; the engine never parses them.

/// Class group identifier.
pub type ClassGroupId = String;
/// Schedule event identifier.
pub type EventId = String;
/// Order (entitlement) identifier.
pub type OrderId = String;
/// Student (member) identifier.
pub type StudentId = String;
/// Teacher identifier.
pub type TeacherId = String;

/// Mint a fresh event identifier.
pub fn new_event_id() -> EventId {
    uuid::Uuid::new_v4().to_string()
}
