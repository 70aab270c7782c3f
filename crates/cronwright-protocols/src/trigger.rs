//! Execution trigger protocol.
//!
//! Creating a workflow execution is an external capability; the scheduling
//! core only builds the request and interprets the outcome.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::SchedulableEntity;
use crate::error::TriggerError;
use crate::identifier::Identifier;

/// Maximum length of a generated execution name.
const EXECUTION_NAME_LEN: usize = 20;

/// Identity of a created execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionId {
    pub project: String,
    pub domain: String,
    pub name: String,
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.project, self.domain, self.name)
    }
}

/// A request to create one execution for one scheduled tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRequest {
    /// Launch plan to execute.
    pub launch_plan: Identifier,
    /// Name for the new execution; unique per attempt.
    pub execution_name: String,
    /// The tick this execution stands for.
    pub scheduled_at: DateTime<Utc>,
    /// Workflow inputs. Holds the kickoff time when the entity names one.
    #[serde(default)]
    pub inputs: BTreeMap<String, serde_json::Value>,
}

impl TriggerRequest {
    /// Build the request for `entity` at `scheduled_at`.
    pub fn for_tick(entity: &SchedulableEntity, scheduled_at: DateTime<Utc>) -> Self {
        let mut inputs = BTreeMap::new();
        if let Some(arg) = entity.kickoff_arg() {
            inputs.insert(
                arg.to_string(),
                serde_json::Value::String(
                    scheduled_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
            );
        }
        Self {
            launch_plan: entity.identifier.clone(),
            execution_name: generate_execution_name(),
            scheduled_at,
            inputs,
        }
    }
}

/// A fresh execution name: a letter followed by random hex.
///
/// Names are random rather than derived from the tick so that a tick retried
/// after a partial failure does not collide with an orphaned attempt.
pub fn generate_execution_name() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    let mut name = String::with_capacity(EXECUTION_NAME_LEN);
    name.push('s');
    name.push_str(&hex[..EXECUTION_NAME_LEN - 1]);
    name
}

/// Creates workflow executions.
#[async_trait]
pub trait ExecutionTrigger: Send + Sync {
    /// Create exactly one execution for the request.
    ///
    /// Returns [`TriggerError::AlreadyExists`] when an execution with the
    /// requested name exists already.
    async fn trigger(&self, request: TriggerRequest) -> Result<ExecutionId, TriggerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{FixedRateUnit, ScheduleSpec};
    use chrono::TimeZone;

    fn entity() -> SchedulableEntity {
        SchedulableEntity::new(
            Identifier::new("p", "d", "lp", "v1"),
            ScheduleSpec::fixed_rate(1, FixedRateUnit::Hour),
        )
    }

    #[test]
    fn test_execution_name_shape() {
        let name = generate_execution_name();
        assert_eq!(name.len(), EXECUTION_NAME_LEN);
        assert!(name.starts_with('s'));
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_execution_names_are_unique() {
        assert_ne!(generate_execution_name(), generate_execution_name());
    }

    #[test]
    fn test_request_without_kickoff_arg_has_no_inputs() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let request = TriggerRequest::for_tick(&entity(), at);
        assert!(request.inputs.is_empty());
        assert_eq!(request.scheduled_at, at);
        assert_eq!(request.launch_plan.name, "lp");
    }

    #[test]
    fn test_request_binds_kickoff_time() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 6, 30, 0).unwrap();
        let request =
            TriggerRequest::for_tick(&entity().with_kickoff_time_input_arg("kickoff"), at);
        assert_eq!(
            request.inputs.get("kickoff"),
            Some(&serde_json::json!("2024-01-01T06:30:00Z"))
        );
    }

    #[test]
    fn test_retries_get_distinct_names() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let first = TriggerRequest::for_tick(&entity(), at);
        let second = TriggerRequest::for_tick(&entity(), at);
        assert_ne!(first.execution_name, second.execution_name);
    }
}
