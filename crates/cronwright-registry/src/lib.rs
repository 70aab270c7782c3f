//! # Cronwright Registry
//!
//! [`ScheduleRegistry`](cronwright_protocols::ScheduleRegistry)
//! implementations: an in-memory map for tests and single-shot runs, and a
//! SQLite table for durable deployments.

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryScheduleRegistry;
pub use sqlite::SqliteScheduleRegistry;
