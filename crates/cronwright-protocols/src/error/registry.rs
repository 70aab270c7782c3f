use thiserror::Error;

use super::ScheduleError;

/// Schedule registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The entity failed validation and was not persisted.
    #[error("Validation failed: {0}")]
    Validation(#[from] ScheduleError),

    /// No entity exists for the identity.
    #[error("Schedule not found: {0}")]
    NotFound(String),

    /// Underlying persistence failure.
    #[error("Storage error: {0}")]
    Storage(String),
}
