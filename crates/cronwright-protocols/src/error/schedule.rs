use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while parsing or evaluating a schedule expression.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Neither (or more than one) schedule variant was populated, or the
    /// cron grammar was rejected.
    #[error("Invalid schedule expression: {0}")]
    InvalidScheduleExpression(String),

    /// A fixed-rate schedule with a zero value.
    #[error("Fixed rate value must be greater than 0")]
    EmptyFixedRate,

    /// The schedule has no fire time after the given instant.
    #[error("Schedule has no fire time after {0}")]
    NoUpcomingFire(DateTime<Utc>),

    /// The schedule produced a fire time that did not move forward.
    #[error("Schedule did not advance past {from} (got {next})")]
    NonAdvancingSchedule {
        from: DateTime<Utc>,
        next: DateTime<Utc>,
    },
}

impl From<cron::error::Error> for ScheduleError {
    fn from(err: cron::error::Error) -> Self {
        ScheduleError::InvalidScheduleExpression(err.to_string())
    }
}
