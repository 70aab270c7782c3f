//! # Cronwright Config
//!
//! Configuration management for the cronwright scheduler.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{
    ConfigValidator, SUPPORTED_SCHEMA_VERSIONS, ValidationError, ValidationResult,
    ValidationWarning,
};
