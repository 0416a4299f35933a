//! Tests for configuration validation

use std::collections::HashMap;

use class_scheduling::config::{EngineConfig, ExpiryRuleConfig};

fn rule(min: u32, max: Option<u32>, days: u32) -> ExpiryRuleConfig {
    ExpiryRuleConfig {
        language: Some("中文".into()),
        min_sessions: min,
        max_sessions: max,
        validity_days: days,
    }
}

#[test]
fn test_engine_config_defaults() {
    let cfg = EngineConfig::new("tenant-a");
    assert_eq!(cfg.session_minutes, 50);
    assert_eq!(cfg.default_search_days, 180);
    assert!(cfg.expiry_rules.is_empty());
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_engine_config_invalid_tenant() {
    assert!(EngineConfig::new("  ").validate().is_err());
}

#[test]
fn test_engine_config_invalid_session_minutes() {
    let mut cfg = EngineConfig::new("tenant-a");
    cfg.session_minutes = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_engine_config_invalid_search_days() {
    let mut cfg = EngineConfig::new("tenant-a");
    cfg.default_search_days = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_expiry_rule_validation() {
    assert!(rule(1, Some(10), 90).validate().is_ok());
    assert!(rule(1, None, 90).validate().is_ok());
    assert!(rule(10, Some(5), 90).validate().is_err());
    assert!(rule(1, Some(10), 0).validate().is_err());

    let mut cfg = EngineConfig::new("tenant-a");
    cfg.expiry_rules = vec![rule(1, Some(10), 90), rule(10, Some(5), 90)];
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("expiry rule #1"));
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "tenant": "tenant-a",
        "session_minutes": 45,
        "expiry_rules": [
            {"language": "中文", "min_sessions": 1, "max_sessions": 10, "validity_days": 90},
            {"min_sessions": 11, "validity_days": 365}
        ]
    }"#;

    let cfg = EngineConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.tenant, "tenant-a");
    assert_eq!(cfg.session_minutes, 45);
    assert_eq!(cfg.default_search_days, 180);
    assert_eq!(cfg.expiry_rules.len(), 2);
    assert_eq!(cfg.expiry_rules[1].language, None);
    assert_eq!(cfg.expiry_rules[1].max_sessions, None);
}

#[test]
fn test_config_from_json_rejects_invalid() {
    assert!(EngineConfig::from_json_str(r#"{"tenant": "t", "session_minutes": 0}"#).is_err());
    assert!(EngineConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_from_lookup() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("SCHEDULER_TENANT", "tenant-b"),
        ("SCHEDULER_SESSION_MINUTES", " 60 "),
        ("SCHEDULER_AUDIT_BUFFER", "16"),
        (
            "SCHEDULER_EXPIRY_RULES",
            r#"[{"min_sessions": 1, "validity_days": 30}]"#,
        ),
    ]);
    let cfg = EngineConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string())).unwrap();
    assert_eq!(cfg.tenant, "tenant-b");
    assert_eq!(cfg.session_minutes, 60);
    assert_eq!(cfg.audit_buffer, 16);
    assert_eq!(cfg.default_search_days, 180);
    assert_eq!(cfg.expiry_rules[0].validity_days, 30);
}

#[test]
fn test_config_from_lookup_errors() {
    assert!(EngineConfig::from_lookup(|_| None).is_err());

    let bad = EngineConfig::from_lookup(|key| match key {
        "SCHEDULER_TENANT" => Some("tenant-b".into()),
        "SCHEDULER_SESSION_MINUTES" => Some("fifty".into()),
        _ => None,
    });
    assert!(bad.unwrap_err().starts_with("SCHEDULER_SESSION_MINUTES"));
}
