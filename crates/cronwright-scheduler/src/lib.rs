//! # Cronwright Scheduler
//!
//! Turns active schedules into triggered workflow executions.
//!
//! - [`JobScheduleAdapter`] - one recurring timer per [`ScheduleKey`](cronwright_protocols::ScheduleKey)
//! - [`CatchUpEngine`] - triggers every tick missed since the last recorded fire
//! - [`Scheduler`] - bootstrap, startup catch-up, periodic reconcile, shutdown

pub mod adapter;
pub mod control_loop;
pub mod engine;
pub mod error;
pub mod leader;
pub mod timer;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::JobScheduleAdapter;
pub use control_loop::{LoopSettings, Scheduler, SchedulerPhase};
pub use engine::{CatchUpEngine, CatchUpReport, CatchUpWindow, EngineSettings};
pub use error::SchedulerError;
pub use leader::{LeaderGuard, SingleInstance};
pub use timer::{FireCallback, ScheduleTimer, TimerTable};
