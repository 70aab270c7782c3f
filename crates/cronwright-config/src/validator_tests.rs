use super::*;

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_zero_reconcile_interval() {
    let mut config = Config::default();
    config.scheduler.reconcile_interval_seconds = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.path == "scheduler.reconcile_interval_seconds")
    );
}

#[test]
fn test_validate_zero_checkpoint_interval() {
    let mut config = Config::default();
    config.snapshot.checkpoint_interval_seconds = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
}

#[test]
fn test_validate_unsupported_schema_version() {
    let mut config = Config::default();
    config.snapshot.schema_version = 7;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.path == "snapshot.schema_version")
    );
}

#[test]
fn test_validate_schema_version_one_accepted() {
    let mut config = Config::default();
    config.snapshot.schema_version = 1;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
}

#[test]
fn test_validate_millisecond_schema_version_warns() {
    let mut config = Config::default();
    config.snapshot.schema_version = 2;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.path == "snapshot.schema_version")
    );
}

#[test]
fn test_validate_bad_epoch() {
    let mut config = Config::default();
    config.scheduler.epoch_start_time = Some("2024-13-45".to_string());

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.path == "scheduler.epoch_start_time")
    );
}

#[test]
fn test_validate_epoch_override_warns() {
    let mut config = Config::default();
    config.scheduler.epoch_start_time = Some("2024-01-01T00:00:00Z".to_string());

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.path == "scheduler.epoch_start_time")
    );
}

#[test]
fn test_validate_zero_jitter_warns() {
    let mut config = Config::default();
    config.scheduler.jitter_seconds = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_validate_empty_endpoint() {
    let mut config = Config::default();
    config.trigger.endpoint = "  ".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
}

#[test]
fn test_validate_endpoint_scheme() {
    let mut config = Config::default();
    config.trigger.endpoint = "flyteadmin:8088".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "trigger.endpoint"));
}

#[test]
fn test_validate_memory_snapshot_warns() {
    let mut config = Config::default();
    config.snapshot.backend = SnapshotBackendKind::Memory;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "snapshot.backend"));
}

#[test]
fn test_validation_result_default() {
    let result = ValidationResult::default();
    assert!(result.is_valid());
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}
