//! In-memory snapshot shape.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cronwright_protocols::ScheduleKey;

/// Mapping of schedule key to the last successfully fired tick.
///
/// This is the latest in-memory shape; older on-disk versions are decoded
/// into it by [`crate::codec::decode`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: BTreeMap<ScheduleKey, DateTime<Utc>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ScheduleKey) -> Option<DateTime<Utc>> {
        self.entries.get(key).copied()
    }

    /// Record `at` for `key`, keeping the later of the stored and new value.
    ///
    /// Returns `true` if the stored value changed.
    pub fn advance(&mut self, key: ScheduleKey, at: DateTime<Utc>) -> bool {
        match self.entries.get(&key) {
            Some(existing) if *existing >= at => false,
            _ => {
                self.entries.insert(key, at);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ScheduleKey, &DateTime<Utc>)> {
        self.entries.iter()
    }
}

impl FromIterator<(ScheduleKey, DateTime<Utc>)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (ScheduleKey, DateTime<Utc>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
