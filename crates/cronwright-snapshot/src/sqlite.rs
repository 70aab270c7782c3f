//! SQLite single-row snapshot backend.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use std::path::{Path, PathBuf};
use tokio_rusqlite::Connection;

use crate::backend::SnapshotBackend;
use crate::error::SnapshotError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schedule_snapshot (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    data BLOB NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// Stores the encoded snapshot as one row of a SQLite table.
pub struct SqliteSnapshotBackend {
    conn: Connection,
    location: String,
}

impl SqliteSnapshotBackend {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, SnapshotError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| SnapshotError::Storage(e.to_string()))?;
        Self::init(conn, ":memory:".to_string()).await
    }

    /// Open (or create) a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let location = path.display().to_string();
        let conn = Connection::open(path)
            .await
            .map_err(|e| SnapshotError::Storage(e.to_string()))?;
        Self::init(conn, location).await
    }

    async fn init(conn: Connection, location: String) -> Result<Self, SnapshotError> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(|e| SnapshotError::Storage(e.to_string()))?;

        Ok(Self { conn, location })
    }
}

#[async_trait]
impl SnapshotBackend for SqliteSnapshotBackend {
    async fn read(&self) -> Result<Option<Vec<u8>>, SnapshotError> {
        self.conn
            .call(|conn| {
                let data = conn
                    .query_row("SELECT data FROM schedule_snapshot WHERE id = 1", [], |row| {
                        row.get::<_, Vec<u8>>(0)
                    })
                    .optional()?;
                Ok(data)
            })
            .await
            .map_err(|e| SnapshotError::Storage(e.to_string()))
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), SnapshotError> {
        let data = bytes.to_vec();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO schedule_snapshot (id, data, updated_at) VALUES (1, ?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                    params![data, now],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| SnapshotError::Storage(e.to_string()))
    }

    fn location(&self) -> String {
        format!("sqlite:{}", self.location)
    }
}
