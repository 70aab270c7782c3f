//! Periodic snapshot persistence.

use std::sync::Arc;

use tokio::time::{self, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::store::SnapshotStore;

/// Background loop that writes the in-memory snapshot on a fixed interval.
///
/// A failed write is logged and retried on the next tick; the loop only
/// exits on cancellation, after one final best-effort write.
pub struct CheckpointLoop {
    store: Arc<SnapshotStore>,
    interval: Duration,
}

impl CheckpointLoop {
    pub fn new(store: Arc<SnapshotStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Run until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            location = %self.store.location(),
            "Checkpoint loop started (interval: {:?})",
            self.interval
        );

        let mut interval = time::interval_at(Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.write_once().await;
                }
                _ = cancel.cancelled() => {
                    self.write_once().await;
                    info!("Checkpoint loop shutting down");
                    break;
                }
            }
        }
    }

    /// Spawn the loop on the current runtime.
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    async fn write_once(&self) {
        if let Err(e) = self.store.checkpoint().await {
            warn!(
                location = %self.store.location(),
                error = %e,
                "Snapshot checkpoint failed, will retry next interval"
            );
        }
    }
}
