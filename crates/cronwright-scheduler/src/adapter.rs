//! Job scheduling adapter.
//!
//! Turns schedulable entities into recurring timers keyed by
//! [`ScheduleKey`]. Registration is idempotent: the same active entity can
//! be registered on every reconcile pass without ever producing a second
//! timer for its key.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use cronwright_protocols::{
    enumerate_fire_times, next_fire_time, SchedulableEntity, ScheduleError, ScheduleKey,
};

use crate::error::SchedulerError;
use crate::timer::{FireCallback, TimerTable};

/// Owns the timer table for one scheduler instance.
#[derive(Default)]
pub struct JobScheduleAdapter {
    timers: TimerTable,
}

impl JobScheduleAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity` so that `on_fire` runs on every tick.
    ///
    /// An inactive entity cancels any existing registration instead. An
    /// existing registration with the same schedule is left untouched; one
    /// with a different schedule is replaced.
    pub fn register(
        &self,
        entity: &SchedulableEntity,
        on_fire: FireCallback,
    ) -> Result<(), SchedulerError> {
        self.register_from(entity, None, on_fire)
    }

    /// Like [`register`](Self::register), with fixed-rate ticks placed on
    /// the grid through `last_fire` so that live fires line up with the
    /// ticks catch-up enumerates.
    pub fn register_from(
        &self,
        entity: &SchedulableEntity,
        last_fire: Option<DateTime<Utc>>,
        on_fire: FireCallback,
    ) -> Result<(), SchedulerError> {
        let key = entity.key();

        if !entity.active {
            if self.cancel(&key) {
                info!(schedule_key = %key, launch_plan = %entity.identifier, "Cancelled inactive schedule");
            }
            return Ok(());
        }

        let compiled = entity
            .schedule
            .compile()
            .map_err(|source| SchedulerError::Registration {
                key: key.to_string(),
                source,
            })?;

        if let Some(existing) = self.timers.get(key.as_str()) {
            if existing.is_valid() && existing.spec() != &entity.schedule {
                info!(
                    schedule_key = %key,
                    launch_plan = %entity.identifier,
                    old = %existing.spec(),
                    new = %entity.schedule,
                    "Schedule changed, replacing timer"
                );
                self.timers.remove(key.as_str());
            }
        }

        match self
            .timers
            .add(key.as_str(), entity.schedule.clone(), compiled, last_fire, on_fire)
        {
            Ok(_) => {
                info!(
                    schedule_key = %key,
                    launch_plan = %entity.identifier,
                    schedule = %entity.schedule,
                    "Registered schedule"
                );
                Ok(())
            }
            Err(SchedulerError::AlreadyRegistered(_)) => {
                debug!(schedule_key = %key, "Schedule already registered");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Best-effort cancel. Returns `true` if a registration existed.
    pub fn cancel(&self, key: &ScheduleKey) -> bool {
        self.timers.remove(key.as_str()).is_some()
    }

    /// The next tick of `entity` strictly after `from`. Registers nothing.
    pub fn next_fire_time(
        &self,
        entity: &SchedulableEntity,
        from: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        next_fire_time(&entity.schedule, from)
    }

    /// Every tick of `entity` in `(from, to]`, ascending.
    pub fn enumerate_fire_times(
        &self,
        entity: &SchedulableEntity,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, ScheduleError> {
        enumerate_fire_times(&entity.schedule, from, to)
    }

    pub fn is_registered(&self, key: &ScheduleKey) -> bool {
        self.timers
            .get(key.as_str())
            .is_some_and(|t| t.is_valid())
    }

    /// Keys with a live timer.
    pub fn registered_keys(&self) -> Vec<ScheduleKey> {
        self.timers
            .ids()
            .into_iter()
            .map(ScheduleKey::from_raw)
            .collect()
    }

    /// Number of fires delivered for `key` so far.
    pub fn fire_count(&self, key: &ScheduleKey) -> Option<u64> {
        self.timers.get(key.as_str()).map(|t| t.fire_count())
    }

    /// Cancel every registration.
    pub fn shutdown(&self) {
        let count = self.timers.len();
        self.timers.clear();
        if count > 0 {
            info!(count, "Cancelled all schedule timers");
        }
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
