//! Scheduler control loop.
//!
//! `Bootstrapping -> CatchingUp -> Steady -> Stopped`. Only bootstrapping
//! failures end the loop with an error; after that every failure is logged
//! and confined to the schedule it belongs to.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use futures::FutureExt;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use cronwright_config::Config;
use cronwright_protocols::{SchedulableEntity, ScheduleKey, ScheduleRegistry};
use cronwright_snapshot::{CheckpointLoop, SnapshotStore};

use crate::adapter::JobScheduleAdapter;
use crate::engine::CatchUpEngine;
use crate::error::SchedulerError;
use crate::leader::LeaderGuard;
use crate::timer::FireCallback;

/// Where the control loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Bootstrapping,
    CatchingUp,
    Steady,
    Stopped,
}

/// Loop cadence.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub reconcile_interval: Duration,
    pub registry_error_backoff: Duration,
    pub checkpoint_interval: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(30),
            registry_error_backoff: Duration::from_secs(60),
            checkpoint_interval: Duration::from_secs(30),
        }
    }
}

impl LoopSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            reconcile_interval: config.scheduler.reconcile_interval(),
            registry_error_backoff: config.scheduler.registry_error_backoff(),
            checkpoint_interval: config.snapshot.checkpoint_interval(),
        }
    }
}

/// Top-level scheduler.
///
/// Exactly one instance may run per registry; see [`LeaderGuard`].
pub struct Scheduler {
    registry: Arc<dyn ScheduleRegistry>,
    snapshot: Arc<SnapshotStore>,
    engine: Arc<CatchUpEngine>,
    adapter: Arc<JobScheduleAdapter>,
    leader: Arc<dyn LeaderGuard>,
    settings: LoopSettings,
    /// Latest entity per key; timer callbacks read from here so a changed
    /// kickoff argument applies without re-creating the timer.
    active: Arc<DashMap<ScheduleKey, SchedulableEntity>>,
    phase: RwLock<SchedulerPhase>,
}

impl Scheduler {
    pub fn new(
        registry: Arc<dyn ScheduleRegistry>,
        snapshot: Arc<SnapshotStore>,
        engine: Arc<CatchUpEngine>,
        leader: Arc<dyn LeaderGuard>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            registry,
            snapshot,
            engine,
            adapter: Arc::new(JobScheduleAdapter::new()),
            leader,
            settings,
            active: Arc::new(DashMap::new()),
            phase: RwLock::new(SchedulerPhase::Idle),
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        *self.phase.read()
    }

    pub fn adapter(&self) -> &JobScheduleAdapter {
        &self.adapter
    }

    fn set_phase(&self, phase: SchedulerPhase) {
        *self.phase.write() = phase;
        debug!(?phase, "Scheduler phase changed");
    }

    /// Run until `cancel` fires. Returns an error only if bootstrapping
    /// fails.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), SchedulerError> {
        self.set_phase(SchedulerPhase::Bootstrapping);
        let mut entities = match self.bootstrap().await {
            Ok(entities) => entities,
            Err(e) => {
                error!(error = %e, "Scheduler bootstrap failed");
                self.set_phase(SchedulerPhase::Stopped);
                return Err(e);
            }
        };

        self.set_phase(SchedulerPhase::CatchingUp);
        let checkpoint_cancel = cancel.child_token();
        let checkpoint = CheckpointLoop::new(self.snapshot.clone(), self.settings.checkpoint_interval)
            .spawn(checkpoint_cancel.clone());
        self.startup_catch_up(&entities, &cancel).await;

        if !cancel.is_cancelled() {
            self.set_phase(SchedulerPhase::Steady);
            info!(
                schedules = entities.len(),
                reconcile_interval = ?self.settings.reconcile_interval,
                "Scheduler entering steady state"
            );
        }

        'steady: while !cancel.is_cancelled() {
            self.reconcile(&entities);

            tokio::select! {
                _ = tokio::time::sleep(self.settings.reconcile_interval) => {}
                _ = cancel.cancelled() => break 'steady,
            }

            loop {
                match self.registry.list_active().await {
                    Ok(fresh) => {
                        entities = fresh;
                        break;
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            backoff = ?self.settings.registry_error_backoff,
                            "Failed to reload schedules, keeping current set"
                        );
                        tokio::select! {
                            _ = tokio::time::sleep(self.settings.registry_error_backoff) => {}
                            _ = cancel.cancelled() => break 'steady,
                        }
                    }
                }
            }
        }

        self.set_phase(SchedulerPhase::Stopped);
        self.adapter.shutdown();
        checkpoint_cancel.cancel();
        if let Err(e) = checkpoint.await {
            warn!(error = %e, "Checkpoint loop ended abnormally");
        }
        info!("Scheduler stopped");
        Ok(())
    }

    async fn bootstrap(&self) -> Result<Vec<SchedulableEntity>, SchedulerError> {
        self.leader.acquire().await?;
        self.snapshot.load().await;
        let entities = self.registry.list_active().await?;
        info!(schedules = entities.len(), "Loaded active schedules");
        Ok(entities)
    }

    /// One pass over every entity, in order, up to the loop start time.
    async fn startup_catch_up(&self, entities: &[SchedulableEntity], cancel: &CancellationToken) {
        let to = Utc::now();
        for entity in entities {
            if cancel.is_cancelled() {
                info!("Shutdown requested during startup catch-up");
                return;
            }
            match self.engine.catch_up(entity, to).await {
                Ok(report) if !report.triggered.is_empty() || !report.failed.is_empty() => {
                    info!(
                        schedule_key = %report.key,
                        launch_plan = %entity.identifier,
                        triggered = report.triggered.len(),
                        failed = report.failed.len(),
                        "Startup catch-up complete"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    error!(
                        schedule_key = %entity.key(),
                        launch_plan = %entity.identifier,
                        error = %e,
                        "Startup catch-up failed"
                    );
                }
            }
        }
    }

    /// Bring timer registrations in line with `entities`.
    fn reconcile(&self, entities: &[SchedulableEntity]) {
        if !self.leader.is_leader() {
            warn!("Lost scheduling leadership, cancelling all timers");
            self.adapter.shutdown();
            self.active.clear();
            return;
        }

        let fresh: HashSet<ScheduleKey> = entities.iter().map(|e| e.key()).collect();

        for key in self.adapter.registered_keys() {
            if !fresh.contains(&key) {
                self.adapter.cancel(&key);
                info!(schedule_key = %key, "Cancelled schedule no longer active");
            }
        }
        self.active.retain(|key, _| fresh.contains(key));

        for entity in entities {
            let key = entity.key();
            self.active.insert(key.clone(), entity.clone());
            let last_fire = self.snapshot.get(&key);
            if let Err(e) = self.adapter.register_from(entity, last_fire, self.on_fire(key)) {
                error!(launch_plan = %entity.identifier, error = %e, "Failed to register schedule");
            }
        }
    }

    fn on_fire(&self, key: ScheduleKey) -> FireCallback {
        let engine = self.engine.clone();
        let active = self.active.clone();
        Arc::new(move |scheduled_at: chrono::DateTime<Utc>| {
            let engine = engine.clone();
            let active = active.clone();
            let key = key.clone();
            async move {
                let Some(entity) = active.get(&key).map(|e| e.value().clone()) else {
                    debug!(schedule_key = %key, "Fire for a schedule that is no longer active");
                    return;
                };
                if let Err(e) = engine.fire(&entity, scheduled_at).await {
                    error!(
                        schedule_key = %key,
                        launch_plan = %entity.identifier,
                        error = %e,
                        "Catch-up failed"
                    );
                }
            }
            .boxed()
        })
    }
}

#[cfg(test)]
#[path = "control_loop_tests.rs"]
mod tests;
