//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base directory for state and logs.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub snapshot: SnapshotConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub trigger: TriggerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            scheduler: SchedulerConfig::default(),
            snapshot: SnapshotConfig::default(),
            registry: RegistryConfig::default(),
            trigger: TriggerConfig::default(),
        }
    }
}

impl Config {
    /// Where the snapshot lives, falling back to a file under `data_dir`.
    pub fn snapshot_location(&self) -> PathBuf {
        self.snapshot.location.clone().unwrap_or_else(|| {
            let file = match self.snapshot.backend {
                SnapshotBackendKind::Sqlite => "snapshot.db",
                _ => "snapshot.json",
            };
            self.data_dir.join(file)
        })
    }

    /// Where the SQLite registry lives, falling back to `data_dir`.
    pub fn registry_path(&self) -> PathBuf {
        self.registry
            .path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("registry.db"))
    }

    /// Directory for rotated log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".cronwright"))
        .unwrap_or_else(|| PathBuf::from(".cronwright"))
}

/// Control loop and catch-up settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Pause between reconciliation passes.
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_seconds: u64,

    /// Extra pause before retrying a failed registry reload.
    #[serde(default = "default_registry_error_backoff")]
    pub registry_error_backoff_seconds: u64,

    /// How far back a brand-new schedule catches up on its first fire.
    #[serde(default = "default_jitter")]
    pub jitter_seconds: u64,

    /// Fixed catch-up start (RFC 3339). When set it takes precedence over
    /// the recorded last fire time of every schedule, on every fire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch_start_time: Option<String>,

    /// Upper bound on a single execution trigger call.
    #[serde(default = "default_trigger_timeout")]
    pub trigger_timeout_seconds: u64,
}

fn default_reconcile_interval() -> u64 {
    30
}

fn default_registry_error_backoff() -> u64 {
    60
}

fn default_jitter() -> u64 {
    60
}

fn default_trigger_timeout() -> u64 {
    30
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_seconds: default_reconcile_interval(),
            registry_error_backoff_seconds: default_registry_error_backoff(),
            jitter_seconds: default_jitter(),
            epoch_start_time: None,
            trigger_timeout_seconds: default_trigger_timeout(),
        }
    }
}

impl SchedulerConfig {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_seconds)
    }

    pub fn registry_error_backoff(&self) -> Duration {
        Duration::from_secs(self.registry_error_backoff_seconds)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_secs(self.jitter_seconds)
    }

    pub fn trigger_timeout(&self) -> Duration {
        Duration::from_secs(self.trigger_timeout_seconds)
    }

    /// The parsed epoch override, if configured.
    pub fn epoch_start_time(&self) -> Result<Option<DateTime<Utc>>, ConfigError> {
        self.epoch_start_time
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw.trim())
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| ConfigError::InvalidValue {
                        field: "scheduler.epoch_start_time".to_string(),
                        message: e.to_string(),
                    })
            })
            .transpose()
    }
}

/// Snapshot persistence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotBackendKind {
    #[default]
    File,
    Sqlite,
    Memory,
}

/// Snapshot and checkpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub backend: SnapshotBackendKind,

    /// File path (file backend) or database path (sqlite backend).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,

    /// Schema version written on save. Every known version is readable.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Pause between checkpoints.
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval_seconds: u64,
}

fn default_schema_version() -> u32 {
    3
}

fn default_checkpoint_interval() -> u64 {
    30
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            backend: SnapshotBackendKind::default(),
            location: None,
            schema_version: default_schema_version(),
            checkpoint_interval_seconds: default_checkpoint_interval(),
        }
    }
}

impl SnapshotConfig {
    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(self.checkpoint_interval_seconds)
    }
}

/// Schedule registry backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackendKind {
    #[default]
    Sqlite,
    Memory,
}

/// Schedule registry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub backend: RegistryBackendKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Execution trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Base URL of the execution service.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// HTTP request timeout.
    #[serde(default = "default_trigger_timeout")]
    pub timeout_seconds: u64,

    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8088".to_string()
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: default_trigger_timeout(),
            headers: HashMap::new(),
        }
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
