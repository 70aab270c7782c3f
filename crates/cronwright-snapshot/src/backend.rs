//! Blob storage for encoded snapshots.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::SnapshotError;

/// Read-whole / write-whole storage for one encoded snapshot.
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Read the stored bytes, or `None` if nothing has been written yet.
    async fn read(&self) -> Result<Option<Vec<u8>>, SnapshotError>;

    /// Replace the stored bytes.
    async fn write(&self, bytes: &[u8]) -> Result<(), SnapshotError>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

/// In-memory backend for testing.
pub struct MemorySnapshotBackend {
    blob: tokio::sync::RwLock<Option<Vec<u8>>>,
}

impl MemorySnapshotBackend {
    pub fn new() -> Self {
        Self {
            blob: tokio::sync::RwLock::new(None),
        }
    }

    /// Seed the backend with raw bytes.
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            blob: tokio::sync::RwLock::new(Some(bytes.into())),
        }
    }
}

impl Default for MemorySnapshotBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotBackend for MemorySnapshotBackend {
    async fn read(&self) -> Result<Option<Vec<u8>>, SnapshotError> {
        Ok(self.blob.read().await.clone())
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), SnapshotError> {
        *self.blob.write().await = Some(bytes.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Single-file backend.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write leaves the previous snapshot intact.
pub struct FileSnapshotBackend {
    path: PathBuf,
}

impl FileSnapshotBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotBackend for FileSnapshotBackend {
    async fn read(&self) -> Result<Option<Vec<u8>>, SnapshotError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        fs::write(&temp, bytes).await?;
        fs::rename(&temp, &self.path).await?;

        debug!(path = ?self.path, bytes = bytes.len(), "Wrote snapshot file");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
