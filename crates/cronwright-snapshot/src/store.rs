//! Internally synchronized snapshot store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use cronwright_protocols::ScheduleKey;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::backend::SnapshotBackend;
use crate::codec::{self, LATEST_VERSION};
use crate::error::SnapshotError;
use crate::snapshot::Snapshot;

/// Owns the in-memory [`Snapshot`] and its durable backing.
///
/// Every access to the map goes through a single internal lock, so firing
/// callbacks, the control loop and the checkpoint loop can share one store
/// without any external locking.
pub struct SnapshotStore {
    backend: Arc<dyn SnapshotBackend>,
    version: u32,
    current: Mutex<Snapshot>,
    /// Serializes writes so an older copy never lands after a newer one.
    write_lock: tokio::sync::Mutex<()>,
}

impl SnapshotStore {
    /// Create a store that writes the latest schema version.
    pub fn new(backend: Arc<dyn SnapshotBackend>) -> Self {
        Self::with_version(backend, LATEST_VERSION)
    }

    /// Create a store that writes a specific schema version.
    pub fn with_version(backend: Arc<dyn SnapshotBackend>, version: u32) -> Self {
        Self {
            backend,
            version,
            current: Mutex::new(Snapshot::new()),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Read and decode the persisted snapshot, surfacing every failure.
    pub async fn try_load(&self) -> Result<Snapshot, SnapshotError> {
        match self.backend.read().await? {
            Some(bytes) => codec::decode(&bytes),
            None => Ok(Snapshot::new()),
        }
    }

    /// Load the persisted snapshot into memory and return a copy of it.
    ///
    /// Never fails: a missing, unreadable or undecodable snapshot is logged
    /// and replaced by an empty one.
    pub async fn load(&self) -> Snapshot {
        let loaded = match self.try_load().await {
            Ok(snapshot) => {
                info!(
                    location = %self.backend.location(),
                    entries = snapshot.len(),
                    "Loaded schedule snapshot"
                );
                snapshot
            }
            Err(e) => {
                warn!(
                    location = %self.backend.location(),
                    error = %e,
                    "Failed to load schedule snapshot, starting from empty"
                );
                Snapshot::new()
            }
        };

        *self.current.lock() = loaded.clone();
        loaded
    }

    /// Encode and persist `snapshot`.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let bytes = codec::encode(snapshot, self.version)?;
        let _guard = self.write_lock.lock().await;
        self.backend.write(&bytes).await?;
        debug!(entries = snapshot.len(), version = self.version, "Saved schedule snapshot");
        Ok(())
    }

    /// Persist whatever the in-memory snapshot currently holds.
    pub async fn checkpoint(&self) -> Result<(), SnapshotError> {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.current();
        let bytes = codec::encode(&snapshot, self.version)?;
        self.backend.write(&bytes).await?;
        debug!(entries = snapshot.len(), version = self.version, "Checkpointed schedule snapshot");
        Ok(())
    }

    /// Last recorded fire time for `key`.
    pub fn get(&self, key: &ScheduleKey) -> Option<DateTime<Utc>> {
        self.current.lock().get(key)
    }

    /// Record a successful fire at `at`. The stored value never moves
    /// backwards; returns `true` if it advanced.
    pub fn set(&self, key: &ScheduleKey, at: DateTime<Utc>) -> bool {
        self.current.lock().advance(key.clone(), at)
    }

    /// A copy of the in-memory snapshot.
    pub fn current(&self) -> Snapshot {
        self.current.lock().clone()
    }

    pub fn location(&self) -> String {
        self.backend.location()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
