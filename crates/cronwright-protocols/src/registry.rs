//! Schedule registry protocol.

use async_trait::async_trait;

use crate::entity::SchedulableEntity;
use crate::error::RegistryError;
use crate::identifier::Identifier;

/// Store of schedule definitions keyed by launch plan identity.
///
/// Implementations perform no retries; retry policy belongs to the caller.
#[async_trait]
pub trait ScheduleRegistry: Send + Sync {
    /// Create or reactivate the entity for `entity.identifier`.
    ///
    /// The schedule is validated first; an invalid schedule returns
    /// [`RegistryError::Validation`] and nothing is persisted. The stored
    /// entity is always active.
    async fn upsert(&self, entity: SchedulableEntity) -> Result<(), RegistryError>;

    /// Soft-deactivate the entity. History is kept.
    async fn deactivate(&self, identifier: &Identifier) -> Result<(), RegistryError>;

    /// All active entities. Polled frequently by the control loop.
    async fn list_active(&self) -> Result<Vec<SchedulableEntity>, RegistryError>;

    /// Fetch a single entity, active or not.
    async fn get(&self, identifier: &Identifier) -> Result<Option<SchedulableEntity>, RegistryError>;
}
