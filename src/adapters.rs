//! Construction of the configured backends.

use std::sync::Arc;

use cronwright_config::{Config, RegistryBackendKind, SnapshotBackendKind};
use cronwright_protocols::{ExecutionTrigger, ScheduleRegistry};
use cronwright_registry::{MemoryScheduleRegistry, SqliteScheduleRegistry};
use cronwright_snapshot::{
    FileSnapshotBackend, MemorySnapshotBackend, SnapshotBackend, SnapshotStore,
    SqliteSnapshotBackend,
};
use cronwright_trigger_http::{HttpExecutionTrigger, HttpTriggerConfig};

/// Open the schedule registry selected by `registry.backend`.
pub(crate) async fn open_registry(
    config: &Config,
) -> Result<Arc<dyn ScheduleRegistry>, Box<dyn std::error::Error>> {
    let registry: Arc<dyn ScheduleRegistry> = match config.registry.backend {
        RegistryBackendKind::Sqlite => {
            Arc::new(SqliteScheduleRegistry::open(config.registry_path()).await?)
        }
        RegistryBackendKind::Memory => Arc::new(MemoryScheduleRegistry::new()),
    };
    Ok(registry)
}

/// Open the snapshot backend selected by `snapshot.backend`.
pub(crate) async fn open_snapshot_backend(
    config: &Config,
) -> Result<Arc<dyn SnapshotBackend>, Box<dyn std::error::Error>> {
    let backend: Arc<dyn SnapshotBackend> = match config.snapshot.backend {
        SnapshotBackendKind::File => Arc::new(FileSnapshotBackend::new(config.snapshot_location())),
        SnapshotBackendKind::Sqlite => {
            Arc::new(SqliteSnapshotBackend::open(config.snapshot_location()).await?)
        }
        SnapshotBackendKind::Memory => Arc::new(MemorySnapshotBackend::new()),
    };
    Ok(backend)
}

/// Snapshot store writing the configured schema version.
pub(crate) async fn open_snapshot_store(
    config: &Config,
) -> Result<Arc<SnapshotStore>, Box<dyn std::error::Error>> {
    let backend = open_snapshot_backend(config).await?;
    Ok(Arc::new(SnapshotStore::with_version(
        backend,
        config.snapshot.schema_version,
    )))
}

/// HTTP execution trigger for `trigger.endpoint`.
pub(crate) fn http_trigger(
    config: &Config,
) -> Result<Arc<dyn ExecutionTrigger>, Box<dyn std::error::Error>> {
    let trigger = HttpExecutionTrigger::new(HttpTriggerConfig {
        endpoint: config.trigger.endpoint.clone(),
        timeout_seconds: config.trigger.timeout_seconds,
        headers: config.trigger.headers.clone(),
    })?;
    Ok(Arc::new(trigger))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cronwright_protocols::{FixedRateUnit, Identifier, SchedulableEntity, ScheduleSpec};

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            data_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_sqlite_registry_persists_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let registry = open_registry(&config).await.unwrap();
        registry
            .upsert(SchedulableEntity::new(
                Identifier::new("p", "d", "lp", "v1"),
                ScheduleSpec::fixed_rate(5, FixedRateUnit::Minute),
            ))
            .await
            .unwrap();
        drop(registry);

        let reopened = open_registry(&config).await.unwrap();
        assert_eq!(reopened.list_active().await.unwrap().len(), 1);
        assert!(dir.path().join("registry.db").exists());
    }

    #[tokio::test]
    async fn test_file_snapshot_location_defaults_to_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let store = open_snapshot_store(&config).await.unwrap();
        store.checkpoint().await.unwrap();
        assert!(dir.path().join("snapshot.json").exists());
    }

    #[tokio::test]
    async fn test_memory_backends() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.registry.backend = RegistryBackendKind::Memory;
        config.snapshot.backend = SnapshotBackendKind::Memory;

        let registry = open_registry(&config).await.unwrap();
        assert!(registry.list_active().await.unwrap().is_empty());
        let store = open_snapshot_store(&config).await.unwrap();
        assert!(store.try_load().await.unwrap().is_empty());
        assert!(!dir.path().join("registry.db").exists());
    }

    #[test]
    fn test_http_trigger_from_config() {
        let config = Config::default();
        assert!(http_trigger(&config).is_ok());
    }
}
