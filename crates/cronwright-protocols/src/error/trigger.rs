use thiserror::Error;

/// Errors returned by an [`ExecutionTrigger`](crate::ExecutionTrigger).
#[derive(Debug, Error)]
pub enum TriggerError {
    /// An execution with the generated name already exists.
    #[error("Execution already exists: {0}")]
    AlreadyExists(String),

    /// The execution service refused the request.
    #[error("Execution rejected: {0}")]
    Rejected(String),

    /// The request could not be delivered.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured bound.
    #[error("Trigger timed out after {0:?}")]
    Timeout(std::time::Duration),
}
