//! Recurring timers and the table that owns them.
//!
//! A [`ScheduleTimer`] is one spawned task that sleeps until the next tick
//! of its schedule and then hands the tick to a callback. Each callback
//! invocation runs on its own task, so a slow fire never delays the next
//! tick or any other timer, and cancelling a timer does not interrupt a
//! fire that has already started.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use cronwright_protocols::{CompiledSchedule, ScheduleSpec};

use crate::error::SchedulerError;

/// Invoked with the nominal tick time each time a timer fires.
pub type FireCallback = Arc<dyn Fn(DateTime<Utc>) -> BoxFuture<'static, ()> + Send + Sync>;

/// A running recurring timer.
pub struct ScheduleTimer {
    /// Timer ID.
    id: String,

    /// The schedule driving this timer.
    spec: ScheduleSpec,

    /// Whether the timer is valid (not cancelled, not exhausted).
    valid: AtomicBool,

    /// Fire count.
    fire_count: AtomicU64,

    cancel: CancellationToken,
}

impl ScheduleTimer {
    /// Spawn a timer on the current runtime.
    ///
    /// Cron schedules sleep until each next instant. Fixed-rate schedules
    /// tick on the grid `anchor + k * period`; without an anchor the first
    /// tick is one period from now.
    pub fn start(
        id: impl Into<String>,
        spec: ScheduleSpec,
        compiled: CompiledSchedule,
        anchor: Option<DateTime<Utc>>,
        callback: FireCallback,
    ) -> Arc<Self> {
        let timer = Arc::new(Self {
            id: id.into(),
            spec,
            valid: AtomicBool::new(true),
            fire_count: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        });

        let runner = timer.clone();
        tokio::spawn(async move {
            match compiled.period() {
                Some(period) => runner.run_interval(period, anchor, callback).await,
                None => runner.run_cron(compiled, callback).await,
            }
        });

        timer
    }

    /// Get the timer ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn spec(&self) -> &ScheduleSpec {
        &self.spec
    }

    /// Check if the timer is valid (not cancelled).
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    /// Get the fire count.
    pub fn fire_count(&self) -> u64 {
        self.fire_count.load(Ordering::Relaxed)
    }

    /// Cancel the timer. In-flight fires run to completion.
    pub fn cancel(&self) {
        self.valid.store(false, Ordering::SeqCst);
        self.cancel.cancel();
        debug!(timer = %self.id, "Timer cancelled");
    }

    async fn run_cron(&self, schedule: CompiledSchedule, callback: FireCallback) {
        let mut last: Option<DateTime<Utc>> = None;

        loop {
            let now = Utc::now();
            // Never hand out the same instant twice, even if the wall clock
            // lags the sleep that just ended.
            let cursor = match last {
                Some(last) if last > now => last,
                _ => now,
            };
            let Some(next) = schedule.next_after(cursor) else {
                debug!(timer = %self.id, "Cron schedule has no upcoming fire");
                self.valid.store(false, Ordering::SeqCst);
                return;
            };

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::select! {
                _ = time::sleep(wait) => {}
                _ = self.cancel.cancelled() => return,
            }

            last = Some(next);
            self.fire(next, &callback);
        }
    }

    async fn run_interval(
        &self,
        period: std::time::Duration,
        anchor: Option<DateTime<Utc>>,
        callback: FireCallback,
    ) {
        let step = match chrono::Duration::from_std(period) {
            Ok(step) if step > chrono::Duration::zero() => step,
            _ => {
                warn!(timer = %self.id, ?period, "Refusing to run a fixed-rate timer with this period");
                self.valid.store(false, Ordering::SeqCst);
                return;
            }
        };

        let now = Utc::now();
        let mut next = first_interval_tick(anchor, step, now);
        let delay = (next - now).to_std().unwrap_or_default();
        let mut interval = time::interval_at(Instant::now() + delay, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.cancel.cancelled() => return,
            }

            // Report the latest grid instant that has passed, so a late or
            // skipped tick still lands on the schedule's grid.
            let now = Utc::now();
            let mut tick = next;
            while tick + step <= now {
                tick = tick + step;
            }
            next = tick + step;
            self.fire(tick, &callback);
        }
    }

    fn fire(&self, at: DateTime<Utc>, callback: &FireCallback) {
        if !self.is_valid() {
            return;
        }
        self.fire_count.fetch_add(1, Ordering::Relaxed);
        debug!(timer = %self.id, tick = %at.to_rfc3339(), "Timer fired");
        tokio::spawn(callback(at));
    }
}

/// First instant of the grid `anchor + k * step` strictly after `now`.
///
/// Without an anchor, or with one in the future, the grid starts one step
/// after the later of the two.
pub(crate) fn first_interval_tick(
    anchor: Option<DateTime<Utc>>,
    step: chrono::Duration,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let Some(anchor) = anchor.filter(|a| *a <= now) else {
        return std::cmp::max(anchor.unwrap_or(now), now) + step;
    };
    match ((now - anchor).num_nanoseconds(), step.num_nanoseconds()) {
        (Some(elapsed), Some(step_ns)) if step_ns > 0 => {
            anchor + chrono::Duration::nanoseconds((elapsed / step_ns + 1) * step_ns)
        }
        _ => now + step,
    }
}

/// Table of live timers keyed by id.
///
/// Adding an id that already has a live timer fails with
/// [`SchedulerError::AlreadyRegistered`]; it never spawns a second timer.
#[derive(Default)]
pub struct TimerTable {
    timers: DashMap<String, Arc<ScheduleTimer>>,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a timer under `id` unless a live one exists already.
    pub fn add(
        &self,
        id: &str,
        spec: ScheduleSpec,
        compiled: CompiledSchedule,
        anchor: Option<DateTime<Utc>>,
        callback: FireCallback,
    ) -> Result<Arc<ScheduleTimer>, SchedulerError> {
        match self.timers.entry(id.to_string()) {
            Entry::Occupied(entry) if entry.get().is_valid() => {
                Err(SchedulerError::AlreadyRegistered(id.to_string()))
            }
            Entry::Occupied(mut entry) => {
                let timer = ScheduleTimer::start(id, spec, compiled, anchor, callback);
                entry.insert(timer.clone());
                Ok(timer)
            }
            Entry::Vacant(entry) => {
                let timer = ScheduleTimer::start(id, spec, compiled, anchor, callback);
                entry.insert(timer.clone());
                Ok(timer)
            }
        }
    }

    /// Cancel and drop the timer under `id`, if any.
    pub fn remove(&self, id: &str) -> Option<Arc<ScheduleTimer>> {
        let (_, timer) = self.timers.remove(id)?;
        timer.cancel();
        Some(timer)
    }

    pub fn get(&self, id: &str) -> Option<Arc<ScheduleTimer>> {
        self.timers.get(id).map(|t| t.value().clone())
    }

    /// Ids of timers that are still live.
    pub fn ids(&self) -> Vec<String> {
        self.timers
            .iter()
            .filter(|t| t.value().is_valid())
            .map(|t| t.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Cancel every timer.
    pub fn clear(&self) {
        for timer in self.timers.iter() {
            timer.value().cancel();
        }
        self.timers.clear();
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
