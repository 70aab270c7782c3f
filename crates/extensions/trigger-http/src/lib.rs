//! # Cronwright Trigger - HTTP
//!
//! Creates workflow executions by calling the admin service's
//! create-execution endpoint.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cronwright_protocols::{ExecutionId, ExecutionTrigger, Identifier, TriggerError, TriggerRequest};

/// Path of the create-execution endpoint, relative to the base URL.
pub const EXECUTIONS_PATH: &str = "/api/v1/executions";

/// HTTP trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpTriggerConfig {
    /// Base URL of the admin service.
    pub endpoint: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Additional headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_timeout() -> u64 {
    30
}

/// Body of a create-execution call.
#[derive(Debug, Serialize)]
pub struct CreateExecutionBody<'a> {
    pub project: &'a str,
    pub domain: &'a str,
    pub name: &'a str,
    pub spec: ExecutionSpec<'a>,
    pub inputs: &'a BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct ExecutionSpec<'a> {
    pub launch_plan: &'a Identifier,
    pub metadata: ExecutionMetadata,
}

#[derive(Debug, Serialize)]
pub struct ExecutionMetadata {
    pub mode: &'static str,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct CreateExecutionResponse {
    id: ExecutionId,
}

/// [`ExecutionTrigger`] backed by an HTTP call.
pub struct HttpExecutionTrigger {
    config: HttpTriggerConfig,
    client: Client,
    url: String,
}

impl HttpExecutionTrigger {
    pub fn new(config: HttpTriggerConfig) -> Result<Self, TriggerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| TriggerError::Transport(e.to_string()))?;
        let url = format!("{}{}", config.endpoint.trim_end_matches('/'), EXECUTIONS_PATH);

        Ok(Self {
            config,
            client,
            url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ExecutionTrigger for HttpExecutionTrigger {
    async fn trigger(&self, request: TriggerRequest) -> Result<ExecutionId, TriggerError> {
        let launch_plan = &request.launch_plan;
        let body = CreateExecutionBody {
            project: &launch_plan.project,
            domain: &launch_plan.domain,
            name: &request.execution_name,
            spec: ExecutionSpec {
                launch_plan,
                metadata: ExecutionMetadata {
                    mode: "SCHEDULED",
                    scheduled_at: request.scheduled_at,
                },
            },
            inputs: &request.inputs,
        };

        let mut http = self.client.post(&self.url).json(&body);
        for (key, value) in &self.config.headers {
            http = http.header(key, value);
        }

        let response = http.send().await.map_err(|e| {
            if e.is_timeout() {
                TriggerError::Timeout(Duration::from_secs(self.config.timeout_seconds))
            } else {
                TriggerError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Err(TriggerError::AlreadyExists(request.execution_name.clone()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TriggerError::Rejected(format!("HTTP {}: {}", status, body)));
        }

        let text = response.text().await.unwrap_or_default();
        let id = parse_execution_id(&text).unwrap_or_else(|| {
            // The service accepted the request, so the execution exists under
            // the requested name even without a usable body.
            if !text.trim().is_empty() {
                warn!(
                    url = %self.url,
                    execution = %request.execution_name,
                    body = %text,
                    "Unrecognized create-execution response, using requested name"
                );
            }
            ExecutionId {
                project: launch_plan.project.clone(),
                domain: launch_plan.domain.clone(),
                name: request.execution_name.clone(),
            }
        });

        debug!(execution = %id, url = %self.url, "Execution created");
        Ok(id)
    }
}

/// The execution id from a create-execution response body, if it has one.
fn parse_execution_id(body: &str) -> Option<ExecutionId> {
    serde_json::from_str::<CreateExecutionResponse>(body)
        .ok()
        .map(|r| r.id)
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
