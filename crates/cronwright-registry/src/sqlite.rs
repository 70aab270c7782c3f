//! SQLite schedule registry.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use cronwright_protocols::{
    Identifier, RegistryError, SchedulableEntity, ScheduleRegistry, ScheduleSpec,
};

use crate::schema::init_schema;

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;

const SELECT_COLUMNS: &str = "SELECT project, domain, name, version, schedule_spec, \
     kickoff_time_input_arg, active FROM schedulable_entities";

/// SQLite-based schedule registry.
pub struct SqliteScheduleRegistry {
    conn: Connection,
}

impl SqliteScheduleRegistry {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, RegistryError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        Self::init(conn).await
    }

    /// Create a new file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| RegistryError::Storage(e.to_string()))?;
            }
        }
        let conn = Connection::open(path)
            .await
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, RegistryError> {
        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        Ok(Self { conn })
    }
}

/// Raw row, decoded outside the connection thread.
struct EntityRow {
    identifier: Identifier,
    schedule_spec: String,
    kickoff_time_input_arg: String,
    active: bool,
}

impl EntityRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            identifier: Identifier::new(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ),
            schedule_spec: row.get(4)?,
            kickoff_time_input_arg: row.get(5)?,
            active: row.get(6)?,
        })
    }

    fn into_entity(self) -> Result<SchedulableEntity, RegistryError> {
        let schedule: ScheduleSpec = serde_json::from_str(&self.schedule_spec).map_err(|e| {
            RegistryError::Storage(format!(
                "corrupt schedule for {}: {}",
                self.identifier, e
            ))
        })?;
        Ok(SchedulableEntity {
            identifier: self.identifier,
            schedule,
            kickoff_time_input_arg: self.kickoff_time_input_arg,
            active: self.active,
        })
    }
}

#[async_trait]
impl ScheduleRegistry for SqliteScheduleRegistry {
    async fn upsert(&self, entity: SchedulableEntity) -> Result<(), RegistryError> {
        entity.schedule.validate()?;

        let spec = serde_json::to_string(&entity.schedule)
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        let id = entity.identifier.clone();
        let kickoff = entity.kickoff_time_input_arg.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO schedulable_entities
                         (project, domain, name, version, schedule_spec, kickoff_time_input_arg,
                          active, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
                     ON CONFLICT(project, domain, name, version) DO UPDATE SET
                         schedule_spec = excluded.schedule_spec,
                         kickoff_time_input_arg = excluded.kickoff_time_input_arg,
                         active = 1,
                         updated_at = excluded.updated_at",
                    params![id.project, id.domain, id.name, id.version, spec, kickoff, now],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| RegistryError::Storage(e.to_string()))?;

        debug!(launch_plan = %entity.identifier, schedule = %entity.schedule, "Upserted schedule");
        Ok(())
    }

    async fn deactivate(&self, identifier: &Identifier) -> Result<(), RegistryError> {
        let id = identifier.clone();
        let now = Utc::now().to_rfc3339();

        let updated = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "UPDATE schedulable_entities SET active = 0, updated_at = ?5
                     WHERE project = ?1 AND domain = ?2 AND name = ?3 AND version = ?4",
                    params![id.project, id.domain, id.name, id.version, now],
                )?;
                Ok(n)
            })
            .await
            .map_err(|e| RegistryError::Storage(e.to_string()))?;

        if updated == 0 {
            return Err(RegistryError::NotFound(identifier.to_string()));
        }
        debug!(launch_plan = %identifier, "Deactivated schedule");
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<SchedulableEntity>, RegistryError> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_COLUMNS} WHERE active = 1 ORDER BY project, domain, name, version"
                ))?;
                let rows = stmt
                    .query_map([], EntityRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e| RegistryError::Storage(e.to_string()))?;

        // A single corrupt row must not hide every other schedule.
        let mut entities = Vec::with_capacity(rows.len());
        for row in rows {
            match row.into_entity() {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!(error = %e, "Skipping unreadable schedule row"),
            }
        }
        Ok(entities)
    }

    async fn get(&self, identifier: &Identifier) -> Result<Option<SchedulableEntity>, RegistryError> {
        let id = identifier.clone();
        let row = self
            .conn
            .call(move |conn| {
                let row = conn
                    .query_row(
                        &format!(
                            "{SELECT_COLUMNS} WHERE project = ?1 AND domain = ?2 AND name = ?3 AND version = ?4"
                        ),
                        params![id.project, id.domain, id.name, id.version],
                        EntityRow::from_row,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(|e| RegistryError::Storage(e.to_string()))?;

        row.map(EntityRow::into_entity).transpose()
    }
}
