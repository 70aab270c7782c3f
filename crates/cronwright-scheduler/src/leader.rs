//! Scheduling leadership.
//!
//! The scheduler assumes it is the only live instance for its registry.
//! Running two instances against the same registry double-fires every
//! schedule. [`LeaderGuard`] is where a real election would plug in.

use async_trait::async_trait;

use crate::error::SchedulerError;

#[async_trait]
pub trait LeaderGuard: Send + Sync {
    /// Block until this instance may schedule, or fail.
    async fn acquire(&self) -> Result<(), SchedulerError>;

    /// Whether this instance still holds leadership.
    fn is_leader(&self) -> bool;
}

/// Always the leader. Correct only when exactly one instance runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleInstance;

#[async_trait]
impl LeaderGuard for SingleInstance {
    async fn acquire(&self) -> Result<(), SchedulerError> {
        Ok(())
    }

    fn is_leader(&self) -> bool {
        true
    }
}
