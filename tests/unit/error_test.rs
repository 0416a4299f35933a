//! Tests for error types

use class_scheduling::core::{AppResult, SchedulingError};

#[test]
fn test_invalid_config_error() {
    let err = SchedulingError::InvalidConfig("tenant must not be empty".to_string());
    assert_eq!(format!("{}", err), "invalid config: tenant must not be empty");
}

#[test]
fn test_invalid_class_group_error() {
    let err = SchedulingError::InvalidClassGroup("class `c1`: max_students must be at least 1".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid class group: class `c1`: max_students must be at least 1"
    );
}

#[test]
fn test_not_found_error() {
    let err = SchedulingError::NotFound("class group c9".to_string());
    assert_eq!(format!("{}", err), "not found: class group c9");
}

#[test]
fn test_app_result_downcasts() {
    fn lookup() -> AppResult<()> {
        Err(SchedulingError::NotFound("event e1".into()).into())
    }
    let err = lookup().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SchedulingError>(),
        Some(SchedulingError::NotFound(_))
    ));
}
