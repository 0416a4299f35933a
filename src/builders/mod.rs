//! Builders to construct engine components from configuration.

pub mod service_builder;

pub use service_builder::build_service;
