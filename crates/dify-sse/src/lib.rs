//! Server-Sent Events consumer for the Dify SDK.
//!
//! Turns a live HTTP response body into discrete [`Event`]s delivered, in
//! order, to a handler:
//!
//! - [`FrameReader`] splits the byte stream into blank-line delimited frames,
//!   independent of how reads are chunked
//! - [`parse_frame`] turns one frame into an [`Event`]
//! - [`SseStream`] runs the read loop on a background task, applies the
//!   sticky-id rule, filters content-free frames and hands events to the
//!   subscriber
//!
//! # Example
//!
//! ```no_run
//! use dify_sse::{SseStream, StreamConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(response: reqwest::Response) -> dify_sse::Result<()> {
//! let mut stream = SseStream::from_response(response, StreamConfig::default());
//! stream
//!     .subscribe(CancellationToken::new(), |event| {
//!         println!("{:?}: {:?}", event.event_type_str(), event.data_str());
//!     })
//!     .await?;
//! println!("last id: {:?}", stream.last_event_id());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod parser;
pub mod reader;
pub mod stream;

pub use config::{DEFAULT_BUFFER_SIZE, StreamConfig};
pub use error::{ParseError, Result, SseError};
pub use event::Event;
pub use parser::parse_frame;
pub use reader::FrameReader;
pub use stream::{SseStream, StreamState};

// Callers need the token type to subscribe.
pub use tokio_util::sync::CancellationToken;
