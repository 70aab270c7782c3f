//! Schedulable entities and their stable keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::identifier::Identifier;
use crate::schedule::ScheduleSpec;

/// A persisted schedule definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulableEntity {
    /// Identity of the scheduled launch plan.
    pub identifier: Identifier,
    /// When to fire.
    pub schedule: ScheduleSpec,
    /// Name of the workflow input that receives the scheduled time.
    /// Empty means the timestamp is not passed.
    #[serde(default)]
    pub kickoff_time_input_arg: String,
    /// Inactive entities are kept for history but never fire.
    pub active: bool,
}

impl SchedulableEntity {
    /// Create a new active entity.
    pub fn new(identifier: Identifier, schedule: ScheduleSpec) -> Self {
        Self {
            identifier,
            schedule,
            kickoff_time_input_arg: String::new(),
            active: true,
        }
    }

    /// Bind the scheduled time to the named workflow input.
    pub fn with_kickoff_time_input_arg(mut self, arg: impl Into<String>) -> Self {
        self.kickoff_time_input_arg = arg.into();
        self
    }

    /// Set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// The stable key for this entity.
    pub fn key(&self) -> ScheduleKey {
        ScheduleKey::for_identifier(&self.identifier)
    }

    /// The kickoff input name, if one is configured.
    pub fn kickoff_arg(&self) -> Option<&str> {
        let arg = self.kickoff_time_input_arg.trim();
        (!arg.is_empty()).then_some(arg)
    }
}

/// Stable key derived from an [`Identifier`].
///
/// Used both as the job registration name and as the snapshot lookup key, so
/// it must not change across releases: it is the first 8 bytes of the
/// SHA-256 digest of the identity, rendered as a decimal integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleKey(String);

impl ScheduleKey {
    /// Derive the key for an identity.
    pub fn for_identifier(id: &Identifier) -> Self {
        let mut hasher = Sha256::new();
        for part in [&id.project, &id.domain, &id.name, &id.version] {
            hasher.update(part.as_bytes());
            // Field separator so ("ab", "c") and ("a", "bc") differ.
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(head).to_string())
    }

    /// Wrap a key read back from storage.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScheduleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
