//! The decoded SSE message.

use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;

/// One decoded Server-Sent Event.
///
/// All fields are kept as raw bytes; the wire format does not promise UTF-8
/// and Base64-decoded payloads may be binary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Event id used for resumption. Empty means "inherit the previous id".
    pub id: Bytes,
    /// Event kind. Empty is the default message type.
    pub event_type: Bytes,
    /// Payload. Multiple `data:` lines are joined with `\n`.
    pub data: Bytes,
    /// Reconnection delay hint in milliseconds, as sent by the server.
    pub retry: Bytes,
}

impl Event {
    /// Create an event carrying only a payload.
    pub fn with_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    /// Whether the event is worth delivering to a subscriber.
    ///
    /// Frames that only carry `id` or `retry` update stream state but are
    /// never delivered.
    pub fn has_content(&self) -> bool {
        !self.event_type.is_empty() || !self.data.is_empty()
    }

    /// The payload as UTF-8.
    pub fn data_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// The event type as UTF-8.
    pub fn event_type_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.event_type).ok()
    }

    /// The event id as UTF-8.
    pub fn id_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.id).ok()
    }

    /// The retry hint as a duration, if it is a plain millisecond count.
    pub fn retry_duration(&self) -> Option<Duration> {
        std::str::from_utf8(&self.retry)
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_millis)
    }

    /// Deserialize the payload as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.data)
    }
}
