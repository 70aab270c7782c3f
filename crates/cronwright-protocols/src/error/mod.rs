//! Error types for the cronwright protocol layer.

mod registry;
mod schedule;
mod trigger;

pub use registry::*;
pub use schedule::*;
pub use trigger::*;
