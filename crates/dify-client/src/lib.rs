//! HTTP client SDK for Dify workflow applications.
//!
//! # Example
//!
//! ```no_run
//! use dify_client::{CancellationToken, DifyClient, Result, RunRequest, WorkflowStreamEvent};
//!
//! # async fn example() -> Result<()> {
//! let client = DifyClient::builder()
//!     .base_url("https://api.dify.ai/v1")
//!     .api_key("app-...")
//!     .build()?;
//!
//! // Blocking run
//! let request = RunRequest::new("abc-123").input("query", "hello");
//! let run = client.workflow().run(request.clone()).await?;
//! println!("{}: {}", run.workflow_run_id, run.data.outputs);
//!
//! // Streaming run
//! client
//!     .workflow()
//!     .run_stream(request, CancellationToken::new(), |event| {
//!         if let Ok(progress) = WorkflowStreamEvent::from_event(&event) {
//!             println!("{}", progress.event);
//!         }
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::WorkflowApi;
pub use client::{ClientBuilder, DifyClient};
pub use error::{Error, Result};
pub use types::*;

pub use dify_sse::{CancellationToken, Event, SseError, SseStream, StreamConfig};
