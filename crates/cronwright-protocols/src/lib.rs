//! # Cronwright Protocols
//!
//! Shared data model and collaborator traits for the cronwright scheduling
//! core. Contains no I/O: registries, triggers and snapshot backends are
//! implemented by other crates against the traits defined here.
//!
//! ## Core Types
//!
//! - [`Identifier`] - Launch plan identity `(project, domain, name, version)`
//! - [`ScheduleSpec`] - Canonical schedule expression (cron or fixed rate)
//! - [`SchedulableEntity`] - A persisted schedule definition
//! - [`ScheduleKey`] - Stable key derived from an [`Identifier`]
//!
//! ## Core Traits
//!
//! - [`ScheduleRegistry`] - Store of schedule definitions
//! - [`ExecutionTrigger`] - Creates one workflow execution per tick

pub mod entity;
pub mod error;
pub mod identifier;
pub mod registry;
pub mod schedule;
pub mod trigger;

pub use entity::{SchedulableEntity, ScheduleKey};
pub use error::{RegistryError, ScheduleError, TriggerError};
pub use identifier::Identifier;
pub use registry::ScheduleRegistry;
pub use schedule::{
    enumerate_fire_times, next_fire_time, parse, CompiledSchedule, CronFields, FixedRateUnit,
    RawSchedule, ScheduleSpec,
};
pub use trigger::{ExecutionId, ExecutionTrigger, TriggerRequest};
