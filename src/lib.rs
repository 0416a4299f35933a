//! # Class Scheduling
//!
//! Entitlement-aware scheduling and publishing for a language school.
//!
//! Students buy session packages (orders). Operators group students into
//! class groups, lay out sessions in a calendar, and push those sessions
//! through `pending -> pre-scheduled -> published`. This crate decides which
//! orders may back a class, how many minutes and how many days the class has
//! left, when a teacher is free, and whether a class has enough paying
//! students to go live.
//!
//! ## Core Problem Solved
//!
//! - **Shared budgets**: a group class can only run as long as its most
//!   constrained member has minutes left, and no later than the earliest
//!   expiry among the orders backing it
//! - **Messy order data**: line items carry loosely typed options; anything
//!   that cannot be parsed is treated as ineligible rather than guessed at
//! - **Concurrent operators**: bulk transitions on one partition are atomic,
//!   and repeating one is a no-op
//!
//! ## Layout
//!
//! - [`core`] holds the pure computations and the event store
//! - [`infra`] holds in-memory collaborator adapters
//! - [`runtime`] wires collaborators and the workflow into a service
//! - [`builders`] assembles that service from [`config::EngineConfig`]
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use class_scheduling::builders::build_service;
//! use class_scheduling::config::EngineConfig;
//! use class_scheduling::infra::*;
//! use class_scheduling::runtime::Collaborators;
//!
//! let service = build_service(
//!     EngineConfig::from_env()?,
//!     Collaborators {
//!         orders: Arc::new(InMemoryOrderSource::new([])),
//!         holidays: Arc::new(InMemoryHolidayProvider::new([])),
//!         teachers: Arc::new(InMemoryTeacherOpenTime::new()),
//!         class_groups: Arc::new(InMemoryClassGroupRepository::new()),
//!         expiry_rules: None,
//!     },
//! )?;
//! let report = service.load_constraints(&class, &condition).await?;
//! ```
//!
//! For complete flows, see `tests/scheduling_workflow_test.rs`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: entitlements, constraints, availability and workflow.
pub mod core;
/// Configuration models for the engine and its expiry rules.
pub mod config;
/// Builders to construct engine components from configuration.
pub mod builders;
/// Infrastructure adapters for orders, calendars and class groups.
pub mod infra;
/// Orchestration service and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
