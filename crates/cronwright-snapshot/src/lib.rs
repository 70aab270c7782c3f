//! # Cronwright Snapshot
//!
//! Durable record of the last successfully fired tick for every schedule.
//!
//! ## Features
//!
//! - Versioned `{version, payload}` envelope; every known version decodes
//!   into the same in-memory [`Snapshot`]
//! - Internally synchronized [`SnapshotStore`] shared by firing callbacks
//!   and the checkpoint loop
//! - File, SQLite and in-memory blob backends
//! - [`CheckpointLoop`] that persists the snapshot on a fixed interval

pub mod backend;
pub mod checkpoint;
pub mod codec;
pub mod error;
pub mod snapshot;
pub mod sqlite;
pub mod store;

pub use backend::{FileSnapshotBackend, MemorySnapshotBackend, SnapshotBackend};
pub use checkpoint::CheckpointLoop;
pub use codec::{decode, encode, LATEST_VERSION};
pub use error::SnapshotError;
pub use snapshot::Snapshot;
pub use sqlite::SqliteSnapshotBackend;
pub use store::SnapshotStore;
