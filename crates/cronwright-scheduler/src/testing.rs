//! Test doubles for the collaborator traits.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use cronwright_protocols::{
    ExecutionId, ExecutionTrigger, Identifier, RegistryError, SchedulableEntity, ScheduleRegistry,
    TriggerError, TriggerRequest,
};
use cronwright_registry::MemoryScheduleRegistry;

/// Records every request; fails the ticks it is told to fail.
#[derive(Default)]
pub(crate) struct RecordingTrigger {
    requests: Mutex<Vec<TriggerRequest>>,
    fail_at: Mutex<HashSet<DateTime<Utc>>>,
    exists_at: Mutex<HashSet<DateTime<Utc>>>,
    delay: Mutex<Option<Duration>>,
}

impl RecordingTrigger {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail_at(&self, tick: DateTime<Utc>) {
        self.fail_at.lock().insert(tick);
    }

    pub(crate) fn already_exists_at(&self, tick: DateTime<Utc>) {
        self.exists_at.lock().insert(tick);
    }

    pub(crate) fn delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub(crate) fn requests(&self) -> Vec<TriggerRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn ticks(&self) -> Vec<DateTime<Utc>> {
        self.requests.lock().iter().map(|r| r.scheduled_at).collect()
    }
}

#[async_trait]
impl ExecutionTrigger for RecordingTrigger {
    async fn trigger(&self, request: TriggerRequest) -> Result<ExecutionId, TriggerError> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let tick = request.scheduled_at;
        let name = request.execution_name.clone();
        let launch_plan = request.launch_plan.clone();
        self.requests.lock().push(request);

        if self.fail_at.lock().contains(&tick) {
            return Err(TriggerError::Rejected("injected failure".to_string()));
        }
        if self.exists_at.lock().contains(&tick) {
            return Err(TriggerError::AlreadyExists(name));
        }
        Ok(ExecutionId {
            project: launch_plan.project,
            domain: launch_plan.domain,
            name,
        })
    }
}

/// Memory registry whose `list_active` fails on chosen call numbers
/// (1-based).
pub(crate) struct FlakyRegistry {
    inner: MemoryScheduleRegistry,
    fail_on: Vec<usize>,
    calls: AtomicUsize,
}

impl FlakyRegistry {
    pub(crate) fn new(fail_on: Vec<usize>) -> Self {
        Self {
            inner: MemoryScheduleRegistry::new(),
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleRegistry for FlakyRegistry {
    async fn upsert(&self, entity: SchedulableEntity) -> Result<(), RegistryError> {
        self.inner.upsert(entity).await
    }

    async fn deactivate(&self, identifier: &Identifier) -> Result<(), RegistryError> {
        self.inner.deactivate(identifier).await
    }

    async fn list_active(&self) -> Result<Vec<SchedulableEntity>, RegistryError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(RegistryError::Storage("registry unavailable".to_string()));
        }
        self.inner.list_active().await
    }

    async fn get(&self, identifier: &Identifier) -> Result<Option<SchedulableEntity>, RegistryError> {
        self.inner.get(identifier).await
    }
}
