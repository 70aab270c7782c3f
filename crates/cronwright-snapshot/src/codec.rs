//! Versioned snapshot encoding.
//!
//! Every persisted snapshot is a JSON envelope `{"version": N, "payload": ...}`.
//! The reader dispatches on `version` and always yields the latest
//! in-memory [`Snapshot`]; an unknown version is a hard error.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use cronwright_protocols::ScheduleKey;
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::snapshot::Snapshot;

/// Schema version written by default.
pub const LATEST_VERSION: u32 = 3;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    payload: serde_json::Value,
}

/// Encode `snapshot` with the given schema version.
pub fn encode(snapshot: &Snapshot, version: u32) -> Result<Vec<u8>, SnapshotError> {
    let payload = match version {
        1 => v1::encode(snapshot)?,
        2 => v2::encode(snapshot)?,
        3 => v3::encode(snapshot)?,
        other => return Err(SnapshotError::UnknownVersion(other)),
    };
    let envelope = Envelope { version, payload };
    Ok(serde_json::to_vec_pretty(&envelope)?)
}

/// Decode an envelope produced by any known schema version.
pub fn decode(bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    match envelope.version {
        1 => v1::decode(envelope.payload),
        2 => v2::decode(envelope.payload),
        3 => v3::decode(envelope.payload),
        other => Err(SnapshotError::UnknownVersion(other)),
    }
}

/// v1: a flat object of key to RFC 3339 timestamp.
mod v1 {
    use super::*;

    pub(super) fn encode(snapshot: &Snapshot) -> Result<serde_json::Value, SnapshotError> {
        let map: BTreeMap<&str, String> = snapshot
            .iter()
            .map(|(k, t)| (k.as_str(), t.to_rfc3339()))
            .collect();
        Ok(serde_json::to_value(map)?)
    }

    pub(super) fn decode(payload: serde_json::Value) -> Result<Snapshot, SnapshotError> {
        let map: BTreeMap<String, String> = serde_json::from_value(payload)?;
        map.into_iter()
            .map(|(key, raw)| -> Result<_, SnapshotError> {
                let at = DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| {
                        SnapshotError::Serialization(format!("bad timestamp for {key}: {e}"))
                    })?
                    .with_timezone(&Utc);
                Ok((ScheduleKey::from_raw(key), at))
            })
            .collect()
    }
}

/// v2: an entry list with millisecond timestamps plus a write time.
mod v2 {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Payload {
        entries: Vec<Entry>,
        written_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Entry {
        key: ScheduleKey,
        last_fire_unix_ms: i64,
    }

    pub(super) fn encode(snapshot: &Snapshot) -> Result<serde_json::Value, SnapshotError> {
        let payload = Payload {
            entries: snapshot
                .iter()
                .map(|(k, t)| Entry {
                    key: k.clone(),
                    last_fire_unix_ms: t.timestamp_millis(),
                })
                .collect(),
            written_at: Utc::now(),
        };
        Ok(serde_json::to_value(payload)?)
    }

    pub(super) fn decode(payload: serde_json::Value) -> Result<Snapshot, SnapshotError> {
        let payload: Payload = serde_json::from_value(payload)?;
        payload
            .entries
            .into_iter()
            .map(|entry| -> Result<_, SnapshotError> {
                let at = Utc
                    .timestamp_millis_opt(entry.last_fire_unix_ms)
                    .single()
                    .ok_or_else(|| {
                        SnapshotError::Serialization(format!(
                            "timestamp out of range for {}: {}",
                            entry.key, entry.last_fire_unix_ms
                        ))
                    })?;
                Ok((entry.key, at))
            })
            .collect()
    }
}

/// v3: like v2, with RFC 3339 timestamps at nanosecond precision.
mod v3 {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Payload {
        entries: Vec<Entry>,
        written_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Entry {
        key: ScheduleKey,
        last_fire: DateTime<Utc>,
    }

    pub(super) fn encode(snapshot: &Snapshot) -> Result<serde_json::Value, SnapshotError> {
        let payload = Payload {
            entries: snapshot
                .iter()
                .map(|(k, t)| Entry {
                    key: k.clone(),
                    last_fire: *t,
                })
                .collect(),
            written_at: Utc::now(),
        };
        Ok(serde_json::to_value(payload)?)
    }

    pub(super) fn decode(payload: serde_json::Value) -> Result<Snapshot, SnapshotError> {
        let payload: Payload = serde_json::from_value(payload)?;
        Ok(payload
            .entries
            .into_iter()
            .map(|entry| (entry.key, entry.last_fire))
            .collect())
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
