//! Request and response types for the Dify workflow API.
//!
//! Only identifying fields are typed; workflow inputs and outputs stay as
//! `serde_json::Value` because their shape is defined by each application.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Run
// ─────────────────────────────────────────────────────────────────────────────

/// How the server returns a workflow run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Wait for the run to finish and return one JSON body.
    #[default]
    Blocking,
    /// Return progress as Server-Sent Events.
    Streaming,
}

/// Request to execute a published workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRequest {
    /// Values for the workflow's input variables.
    #[serde(default)]
    pub inputs: Map<String, Value>,
    /// Response mode. Overwritten by `run` and `run_stream`.
    #[serde(default)]
    pub response_mode: ResponseMode,
    /// End-user identifier, unique within the application.
    pub user: String,
    /// Previously uploaded file references, passed through as-is.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<Value>,
}

impl RunRequest {
    /// Create a request for the given end user.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Default::default()
        }
    }

    /// Set one input variable.
    pub fn input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }
}

/// Result of a blocking run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunBlockingResponse {
    /// Workflow execution ID.
    pub workflow_run_id: String,
    /// Task ID, used to stop the run.
    pub task_id: String,
    /// Run details.
    pub data: WorkflowRunData,
}

/// Details of a finished run, as embedded in a blocking response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunData {
    /// Workflow execution ID.
    pub id: String,
    /// Workflow ID.
    #[serde(default)]
    pub workflow_id: String,
    /// `running`, `succeeded`, `failed` or `stopped`.
    pub status: String,
    /// Output variables.
    #[serde(default)]
    pub outputs: Value,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Elapsed time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,
    /// Tokens consumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    /// Steps executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<u64>,
    /// Start time (unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// End time (unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<i64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Streaming
// ─────────────────────────────────────────────────────────────────────────────

/// A workflow progress event carried in an SSE `data` payload.
///
/// Dify puts the event kind inside the JSON rather than in the SSE `event`
/// field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStreamEvent {
    /// `workflow_started`, `node_started`, `node_finished`,
    /// `workflow_finished`, `ping`, ...
    pub event: String,
    /// Task ID, used to stop the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Workflow execution ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<String>,
    /// Event-specific details.
    #[serde(default)]
    pub data: Value,
}

impl WorkflowStreamEvent {
    /// Decode from an SSE event's payload.
    pub fn from_event(event: &dify_sse::Event) -> serde_json::Result<Self> {
        event.json()
    }

    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        self.event == "workflow_finished"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Detail
// ─────────────────────────────────────────────────────────────────────────────

/// Current state of a workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunDetail {
    /// Workflow execution ID.
    pub id: String,
    /// Workflow ID.
    #[serde(default)]
    pub workflow_id: String,
    /// `running`, `succeeded`, `failed` or `stopped`.
    pub status: String,
    /// Inputs as recorded by the server.
    #[serde(default)]
    pub inputs: Value,
    /// Output variables.
    #[serde(default)]
    pub outputs: Value,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Steps executed.
    #[serde(default)]
    pub total_steps: u64,
    /// Tokens consumed.
    #[serde(default)]
    pub total_tokens: u64,
    /// Start time (unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// End time (unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<i64>,
    /// Elapsed time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Stop
// ─────────────────────────────────────────────────────────────────────────────

/// Request to stop a streaming run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopRequest {
    /// End-user identifier; must match the user that started the run.
    pub user: String,
}

/// Response to a stop request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopResponse {
    /// Always `success`.
    pub result: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Logs
// ─────────────────────────────────────────────────────────────────────────────

/// Filter for workflow logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsRequest {
    /// Search keyword.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// `succeeded`, `failed` or `stopped`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Page number, starting at 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Entries per page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// One page of workflow logs, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    /// Current page.
    #[serde(default)]
    pub page: u32,
    /// Entries per page.
    #[serde(default)]
    pub limit: u32,
    /// Total matching entries.
    #[serde(default)]
    pub total: u64,
    /// Whether more pages follow.
    #[serde(default)]
    pub has_more: bool,
    /// Log entries.
    #[serde(default)]
    pub data: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_request_serialization() {
        let request = RunRequest::new("abc-123").input("query", "hello").input("n", 3);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["inputs"]["query"], "hello");
        assert_eq!(value["inputs"]["n"], 3);
        assert_eq!(value["response_mode"], "blocking");
        assert_eq!(value["user"], "abc-123");
        assert!(value.get("files").is_none());
    }

    #[test]
    fn test_logs_request_skips_unset_fields() {
        let request = LogsRequest {
            status: Some("failed".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({"status": "failed"}));
    }

    #[test]
    fn test_stream_event_from_sse() {
        let event = dify_sse::Event::with_data(
            r#"{"event":"workflow_started","task_id":"t-1","workflow_run_id":"r-1","data":{"id":"r-1"}}"#,
        );
        let parsed = WorkflowStreamEvent::from_event(&event).unwrap();
        assert_eq!(parsed.event, "workflow_started");
        assert_eq!(parsed.task_id.as_deref(), Some("t-1"));
        assert!(!parsed.is_terminal());

        let ping = WorkflowStreamEvent::from_event(&dify_sse::Event::with_data(r#"{"event":"ping"}"#))
            .unwrap();
        assert!(ping.task_id.is_none());
        assert!(ping.data.is_null());
    }

    #[test]
    fn test_detail_tolerates_missing_fields() {
        let detail: WorkflowRunDetail = serde_json::from_value(json!({
            "id": "r-1",
            "status": "running",
        }))
        .unwrap();
        assert_eq!(detail.total_steps, 0);
        assert!(detail.outputs.is_null());
    }
}
