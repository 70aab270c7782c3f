//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{Config, SnapshotBackendKind};

/// Snapshot schema versions this build can write.
pub const SUPPORTED_SCHEMA_VERSIONS: &[u32] = &[1, 2, 3];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_scheduler(config, &mut result);
        Self::validate_snapshot(config, &mut result);
        Self::validate_trigger(config, &mut result);

        Ok(result)
    }

    fn validate_scheduler(config: &Config, result: &mut ValidationResult) {
        let scheduler = &config.scheduler;

        if scheduler.reconcile_interval_seconds == 0 {
            result.add_error(ValidationError::new(
                "scheduler.reconcile_interval_seconds",
                "reconcile_interval_seconds must be greater than 0",
            ));
        }

        if scheduler.trigger_timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "scheduler.trigger_timeout_seconds",
                "trigger_timeout_seconds must be greater than 0",
            ));
        }

        if scheduler.jitter_seconds == 0 {
            result.add_warning(ValidationWarning::new(
                "scheduler.jitter_seconds",
                "jitter is 0, a new schedule will not catch up on a tick it just missed",
            ));
        }

        match scheduler.epoch_start_time() {
            Ok(Some(epoch)) => {
                result.add_warning(ValidationWarning::new(
                    "scheduler.epoch_start_time",
                    format!(
                        "epoch override {} replaces recorded fire times for every schedule",
                        epoch.to_rfc3339()
                    ),
                ));
            }
            Ok(None) => {}
            Err(e) => {
                result.add_error(ValidationError::new(
                    "scheduler.epoch_start_time",
                    e.to_string(),
                ));
            }
        }
    }

    fn validate_snapshot(config: &Config, result: &mut ValidationResult) {
        let snapshot = &config.snapshot;

        if !SUPPORTED_SCHEMA_VERSIONS.contains(&snapshot.schema_version) {
            result.add_error(ValidationError::new(
                "snapshot.schema_version",
                format!(
                    "Unsupported schema version {}, valid values: {:?}",
                    snapshot.schema_version, SUPPORTED_SCHEMA_VERSIONS
                ),
            ));
        }

        if snapshot.schema_version == 2 {
            result.add_warning(ValidationWarning::new(
                "snapshot.schema_version",
                "schema version 2 truncates fire times to milliseconds",
            ));
        }

        if snapshot.checkpoint_interval_seconds == 0 {
            result.add_error(ValidationError::new(
                "snapshot.checkpoint_interval_seconds",
                "checkpoint_interval_seconds must be greater than 0",
            ));
        }

        if snapshot.backend == SnapshotBackendKind::Memory {
            result.add_warning(ValidationWarning::new(
                "snapshot.backend",
                "memory snapshot does not survive restarts",
            ));
        }
    }

    fn validate_trigger(config: &Config, result: &mut ValidationResult) {
        let endpoint = config.trigger.endpoint.trim();

        if endpoint.is_empty() {
            result.add_error(ValidationError::new(
                "trigger.endpoint",
                "Endpoint cannot be empty",
            ));
        } else if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            result.add_error(ValidationError::new(
                "trigger.endpoint",
                "endpoint must start with http:// or https://",
            ));
        }

        if config.trigger.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "trigger.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
