//! Scheduler errors.

use thiserror::Error;

use cronwright_protocols::{RegistryError, ScheduleError};

/// Scheduler error types.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Startup could not establish a baseline. Fatal.
    #[error("Bootstrap failed: {0}")]
    Bootstrap(#[from] RegistryError),

    /// One schedule could not be turned into a timer.
    #[error("Failed to register schedule {key}: {source}")]
    Registration {
        key: String,
        #[source]
        source: ScheduleError,
    },

    /// The timer primitive already holds a live timer under this id.
    #[error("Timer already registered: {0}")]
    AlreadyRegistered(String),

    /// Another instance owns scheduling.
    #[error("Not the scheduling leader: {0}")]
    NotLeader(String),

    /// Settings could not be derived from configuration.
    #[error("Invalid scheduler configuration: {0}")]
    Config(#[from] cronwright_config::ConfigError),
}
