//! Snapshot errors.

use thiserror::Error;

/// Snapshot error types.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The envelope carries a schema version with no registered decoder.
    #[error("Unknown snapshot schema version: {0}")]
    UnknownVersion(u32),

    /// Database-backed storage failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Serialization(err.to_string())
    }
}
