//! In-memory schedule registry.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use cronwright_protocols::{Identifier, RegistryError, SchedulableEntity, ScheduleRegistry};

/// Registry backed by a map, lost on restart.
pub struct MemoryScheduleRegistry {
    entities: RwLock<HashMap<Identifier, SchedulableEntity>>,
}

impl MemoryScheduleRegistry {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryScheduleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleRegistry for MemoryScheduleRegistry {
    async fn upsert(&self, entity: SchedulableEntity) -> Result<(), RegistryError> {
        entity.schedule.validate()?;

        let entity = entity.with_active(true);
        debug!(launch_plan = %entity.identifier, schedule = %entity.schedule, "Upserting schedule");
        self.entities
            .write()
            .await
            .insert(entity.identifier.clone(), entity);
        Ok(())
    }

    async fn deactivate(&self, identifier: &Identifier) -> Result<(), RegistryError> {
        let mut entities = self.entities.write().await;
        match entities.get_mut(identifier) {
            Some(entity) => {
                entity.active = false;
                debug!(launch_plan = %identifier, "Deactivated schedule");
                Ok(())
            }
            None => Err(RegistryError::NotFound(identifier.to_string())),
        }
    }

    async fn list_active(&self) -> Result<Vec<SchedulableEntity>, RegistryError> {
        let entities = self.entities.read().await;
        let mut active: Vec<_> = entities.values().filter(|e| e.active).cloned().collect();
        active.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(active)
    }

    async fn get(&self, identifier: &Identifier) -> Result<Option<SchedulableEntity>, RegistryError> {
        Ok(self.entities.read().await.get(identifier).cloned())
    }
}
