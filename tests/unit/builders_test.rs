//! Tests for service builders

use std::sync::Arc;

use class_scheduling::builders::build_service;
use class_scheduling::config::{EngineConfig, ExpiryRuleConfig};
use class_scheduling::core::SchedulingError;
use class_scheduling::infra::{
    InMemoryClassGroupRepository, InMemoryHolidayProvider, InMemoryOrderSource,
    InMemoryTeacherOpenTime, NoExpiryRules,
};
use class_scheduling::runtime::{health, Collaborators};

fn collaborators() -> Collaborators {
    Collaborators {
        orders: Arc::new(InMemoryOrderSource::new([])),
        holidays: Arc::new(InMemoryHolidayProvider::new([])),
        teachers: Arc::new(InMemoryTeacherOpenTime::new()),
        class_groups: Arc::new(InMemoryClassGroupRepository::new()),
        expiry_rules: None,
    }
}

#[test]
fn test_build_service_from_config() {
    let mut cfg = EngineConfig::new("tenant-a");
    cfg.expiry_rules.push(ExpiryRuleConfig {
        language: None,
        min_sessions: 1,
        max_sessions: None,
        validity_days: 30,
    });

    let service = build_service(cfg, collaborators()).unwrap();
    assert_eq!(service.config().tenant, "tenant-a");
    assert_eq!(service.store().tenant(), "tenant-a");
    assert!(service.store().is_empty());

    let status = health(&service);
    assert!(status.ok);
    assert_eq!(status.tenant, "tenant-a");
    assert_eq!(status.events, 0);
}

#[test]
fn test_build_service_with_explicit_rules() {
    let mut deps = collaborators();
    deps.expiry_rules = Some(Arc::new(NoExpiryRules));
    assert!(build_service(EngineConfig::new("tenant-a"), deps).is_ok());
}

#[test]
fn test_build_service_rejects_invalid_config() {
    let mut cfg = EngineConfig::new("tenant-a");
    cfg.session_minutes = 0;
    let err = build_service(cfg, collaborators()).err().unwrap();
    assert!(matches!(err, SchedulingError::InvalidConfig(_)));
}
