//! Workflow API.

use dify_sse::{Event, SseStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::DifyClient;
use crate::error::Result;
use crate::types::{
    LogsRequest, LogsResponse, ResponseMode, RunBlockingResponse, RunRequest, StopRequest,
    StopResponse, WorkflowRunDetail,
};

/// Workflow API client.
pub struct WorkflowApi {
    client: DifyClient,
}

impl WorkflowApi {
    pub(crate) fn new(client: DifyClient) -> Self {
        Self { client }
    }

    /// Execute a published workflow and wait for its result.
    pub async fn run(&self, mut request: RunRequest) -> Result<RunBlockingResponse> {
        request.response_mode = ResponseMode::Blocking;
        let response: RunBlockingResponse = self.client.post("workflows/run", &request).await?;
        info!(
            workflow_run_id = %response.workflow_run_id,
            status = %response.data.status,
            "Workflow run finished"
        );
        Ok(response)
    }

    /// Start a streaming run and return the unsubscribed event stream.
    ///
    /// The HTTP status is not checked here; [`SseStream::subscribe`] reports
    /// a non-success status as a connection error.
    pub async fn open_stream(&self, mut request: RunRequest) -> Result<SseStream> {
        request.response_mode = ResponseMode::Streaming;
        let response = self.client.post_stream("workflows/run", &request).await?;
        debug!(status = response.status().as_u16(), "Workflow stream opened");
        Ok(SseStream::from_response(
            response,
            self.client.stream_config().clone(),
        ))
    }

    /// Execute a published workflow, calling `handler` for each progress
    /// event until the server closes the stream.
    pub async fn run_stream<F>(
        &self,
        request: RunRequest,
        cancel: CancellationToken,
        handler: F,
    ) -> Result<()>
    where
        F: FnMut(Event),
    {
        let mut stream = self.open_stream(request).await?;
        stream.subscribe(cancel, handler).await?;
        Ok(())
    }

    /// Get the current state of a workflow execution.
    pub async fn detail(&self, workflow_run_id: &str) -> Result<WorkflowRunDetail> {
        self.client
            .get(&format!("workflows/run/{}", workflow_run_id))
            .await
    }

    /// Stop a streaming run. Only streaming runs can be stopped.
    pub async fn stop(&self, task_id: &str, user: &str) -> Result<StopResponse> {
        let request = StopRequest {
            user: user.to_string(),
        };
        self.client
            .post(&format!("workflows/run/{}/stop", task_id), &request)
            .await
    }

    /// Fetch workflow logs. The first page holds the newest entries.
    pub async fn logs(&self, filter: &LogsRequest) -> Result<LogsResponse> {
        self.client.post("workflows/logs", filter).await
    }
}
