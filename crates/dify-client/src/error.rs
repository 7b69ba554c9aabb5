//! Client error types.

use dify_sse::SseError;
use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error code from server.
        code: String,
        /// Error message from server.
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A streaming response did not start in time.
    #[error("Timed out after {0:?} waiting for the stream to start")]
    Timeout(std::time::Duration),

    /// Streaming run failed.
    #[error("Stream error: {0}")]
    Stream(#[from] SseError),
}

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_)) || matches!(self, Error::Api { status: 404, .. })
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
            || matches!(self, Error::Api { status: 401, .. })
            || matches!(self, Error::Stream(SseError::Connection { status: 401, .. }))
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Api { status: 429, .. })
            || matches!(self, Error::Stream(SseError::Connection { status: 429, .. }))
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        match self {
            Error::Api { status, .. } | Error::Stream(SseError::Connection { status, .. }) => {
                *status >= 500
            }
            _ => false,
        }
    }

    /// Check if a streaming run was cancelled by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Stream(SseError::Cancelled))
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error body returned by the Dify API.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
