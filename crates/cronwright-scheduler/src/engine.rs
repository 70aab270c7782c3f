//! Catch-up and execution engine.
//!
//! For one schedule and one upper bound `to`, works out which ticks were
//! missed since the last recorded fire and triggers one execution per tick,
//! oldest first, advancing the snapshot after each success.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info, warn};

use cronwright_config::Config;
use cronwright_protocols::{
    enumerate_fire_times, ExecutionTrigger, SchedulableEntity, ScheduleError, ScheduleKey,
    TriggerError, TriggerRequest,
};
use cronwright_snapshot::SnapshotStore;

use crate::error::SchedulerError;

/// Settings that shape each catch-up pass.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// How far back a schedule with no recorded fire looks.
    pub jitter: Duration,
    /// When set, every window starts here regardless of the snapshot.
    pub epoch_start_time: Option<DateTime<Utc>>,
    /// Upper bound on one trigger call.
    pub trigger_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            jitter: Duration::from_secs(60),
            epoch_start_time: None,
            trigger_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Result<Self, SchedulerError> {
        Ok(Self {
            jitter: config.scheduler.jitter(),
            epoch_start_time: config.scheduler.epoch_start_time()?,
            trigger_timeout: config.scheduler.trigger_timeout(),
        })
    }
}

/// The span a single catch-up pass covers: ticks in `(from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchUpWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Outcome of one catch-up pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchUpReport {
    pub key: ScheduleKey,
    pub window: CatchUpWindow,
    /// Ticks whose execution was created (or already existed).
    pub triggered: Vec<DateTime<Utc>>,
    /// Ticks whose trigger failed; the snapshot was not advanced for them.
    pub failed: Vec<DateTime<Utc>>,
    /// Ticks at or before the recorded last fire, never re-triggered.
    pub skipped: usize,
}

impl CatchUpReport {
    fn empty(key: ScheduleKey, window: CatchUpWindow) -> Self {
        Self {
            key,
            window,
            triggered: Vec::new(),
            failed: Vec::new(),
            skipped: 0,
        }
    }
}

/// Runs catch-up passes against a shared snapshot.
pub struct CatchUpEngine {
    snapshot: Arc<SnapshotStore>,
    trigger: Arc<dyn ExecutionTrigger>,
    settings: EngineSettings,
    /// One lock per key: a timer fire and a startup pass for the same
    /// schedule never interleave.
    in_flight: DashMap<ScheduleKey, Arc<tokio::sync::Mutex<()>>>,
}

impl CatchUpEngine {
    pub fn new(
        snapshot: Arc<SnapshotStore>,
        trigger: Arc<dyn ExecutionTrigger>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            snapshot,
            trigger,
            settings,
            in_flight: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Window for `key` ending at `to`.
    ///
    /// `from` is the configured epoch start if there is one, else the
    /// recorded last fire, else `to - jitter`.
    pub fn resolve_window(&self, key: &ScheduleKey, to: DateTime<Utc>) -> CatchUpWindow {
        let from = if let Some(epoch) = self.settings.epoch_start_time {
            epoch
        } else if let Some(last) = self.snapshot.get(key) {
            last
        } else {
            let jitter = chrono::Duration::from_std(self.settings.jitter)
                .unwrap_or_else(|_| chrono::Duration::zero());
            to - jitter
        };
        CatchUpWindow { from, to }
    }

    /// Trigger every missed tick of `entity` up to and including `to`.
    pub async fn catch_up(
        &self,
        entity: &SchedulableEntity,
        to: DateTime<Utc>,
    ) -> Result<CatchUpReport, ScheduleError> {
        self.run(entity, to, None).await
    }

    /// Handle one timer fire for the tick `scheduled_at`.
    ///
    /// Missed ticks are caught up as in [`catch_up`](Self::catch_up). When
    /// none of them is newer than the recorded last fire, the fired tick
    /// itself is triggered, so every fire covers its own tick even when the
    /// window holds no enumerated instant.
    pub async fn fire(
        &self,
        entity: &SchedulableEntity,
        scheduled_at: DateTime<Utc>,
    ) -> Result<CatchUpReport, ScheduleError> {
        let to = std::cmp::max(Utc::now(), scheduled_at);
        self.run(entity, to, Some(scheduled_at)).await
    }

    async fn run(
        &self,
        entity: &SchedulableEntity,
        to: DateTime<Utc>,
        fired: Option<DateTime<Utc>>,
    ) -> Result<CatchUpReport, ScheduleError> {
        let key = entity.key();
        let lock = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let window = self.resolve_window(&key, to);
        let mut report = CatchUpReport::empty(key.clone(), window);
        if window.from >= window.to {
            return Ok(report);
        }

        let mut ticks = enumerate_fire_times(&entity.schedule, window.from, window.to)?;
        if let Some(fired) = fired {
            let last = self.snapshot.get(&key);
            let is_new = |t: &DateTime<Utc>| last.is_none_or(|last| *t > last);
            if fired > window.from && !ticks.iter().any(is_new) && is_new(&fired) {
                ticks.push(fired);
            }
        }
        if ticks.is_empty() {
            return Ok(report);
        }
        debug!(
            schedule_key = %key,
            launch_plan = %entity.identifier,
            from = %window.from.to_rfc3339(),
            to = %window.to.to_rfc3339(),
            ticks = ticks.len(),
            "Catching up schedule"
        );

        for tick in ticks {
            if self.snapshot.get(&key).is_some_and(|last| tick <= last) {
                report.skipped += 1;
                continue;
            }

            match self.trigger_tick(entity, tick).await {
                Ok(()) => {
                    self.snapshot.set(&key, tick);
                    report.triggered.push(tick);
                }
                Err(e) => {
                    warn!(
                        schedule_key = %key,
                        launch_plan = %entity.identifier,
                        scheduled_at = %tick.to_rfc3339(),
                        error = %e,
                        "Failed to trigger execution"
                    );
                    report.failed.push(tick);
                }
            }
        }

        if report.skipped > 0 {
            debug!(schedule_key = %key, skipped = report.skipped, "Skipped ticks already recorded");
        }
        Ok(report)
    }

    async fn trigger_tick(
        &self,
        entity: &SchedulableEntity,
        tick: DateTime<Utc>,
    ) -> Result<(), TriggerError> {
        let request = TriggerRequest::for_tick(entity, tick);
        let execution_name = request.execution_name.clone();

        let outcome = tokio::time::timeout(self.settings.trigger_timeout, self.trigger.trigger(request))
            .await
            .unwrap_or(Err(TriggerError::Timeout(self.settings.trigger_timeout)));

        match outcome {
            Ok(execution) => {
                info!(
                    launch_plan = %entity.identifier,
                    scheduled_at = %tick.to_rfc3339(),
                    execution = %execution,
                    "Triggered scheduled execution"
                );
                Ok(())
            }
            Err(TriggerError::AlreadyExists(_)) => {
                info!(
                    launch_plan = %entity.identifier,
                    scheduled_at = %tick.to_rfc3339(),
                    execution = %execution_name,
                    "Execution already exists, treating tick as fired"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
