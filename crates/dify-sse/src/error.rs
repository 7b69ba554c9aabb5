//! Error types for the SSE stream consumer.

use thiserror::Error;

use crate::event::Event;

/// Result type alias using the SSE error type.
pub type Result<T> = std::result::Result<T, SseError>;

/// Terminal errors surfaced by [`SseStream::subscribe`](crate::SseStream::subscribe).
#[derive(Debug, Error)]
pub enum SseError {
    /// The response did not carry a success status; nothing was read.
    #[error("could not connect to stream: {reason}")]
    Connection {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        reason: String,
    },

    /// Reading the body failed after streaming began.
    #[error("stream transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The subscription was cancelled through its token.
    #[error("stream cancelled")]
    Cancelled,

    /// The stream has already been consumed by an earlier subscribe call.
    #[error("stream already subscribed")]
    AlreadySubscribed,

    /// The background read loop died without reporting a result.
    #[error("read loop failed: {0}")]
    ReadLoop(String),
}

impl SseError {
    /// Check if this error happened before any bytes were read.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, SseError::Connection { .. })
    }

    /// Check if this error came from the underlying transport.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, SseError::Transport(_))
    }

    /// Check if the stream was cancelled by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SseError::Cancelled)
    }
}

/// Per-frame parse failures.
///
/// These never end a subscription: the read loop drops the offending frame
/// and keeps reading.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The frame contained no bytes.
    #[error("event message was empty")]
    Empty,

    /// Base64 decoding of the `data` field failed.
    #[error("failed to decode event message: {source}")]
    Base64 {
        /// Underlying decode error.
        source: base64::DecodeError,
        /// The event with whatever prefix of `data` could be decoded.
        partial: Box<Event>,
    },
}

impl ParseError {
    /// The best-effort event built before the failure, if any.
    pub fn partial(&self) -> Option<&Event> {
        match self {
            ParseError::Empty => None,
            ParseError::Base64 { partial, .. } => Some(partial),
        }
    }
}
