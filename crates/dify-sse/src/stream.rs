//! Stream controller: binds one HTTP response to one subscription.
//!
//! A background task owns the response body and runs the read loop
//! (frame reader, parser, sticky id, content filter). Each event is handed
//! to the subscriber together with a oneshot acknowledgement, and the loop
//! does not read the next frame until the handler has returned. A handler
//! that blocks stalls the network read; the loop never holds more than the
//! one event in flight.

use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::StatusCode;
use tokio::io::AsyncRead;
use tokio::sync::{mpsc, oneshot};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::StreamConfig;
use crate::error::{ParseError, Result, SseError};
use crate::event::Event;
use crate::parser::parse_frame;
use crate::reader::FrameReader;

type Body = Box<dyn AsyncRead + Send + Unpin>;

/// Lifecycle of a [`SseStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Bound to a response, not yet subscribed.
    Created,
    /// Status accepted, read loop about to start.
    Connected,
    /// Read loop running.
    Draining,
    /// Ended cleanly at end of stream.
    Closed,
    /// Ended with an error (bad status, transport failure or cancellation).
    Failed,
}

impl StreamState {
    /// Whether the stream has finished and cannot be subscribed again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamState::Closed | StreamState::Failed)
    }
}

/// One live SSE subscription over an established HTTP response.
pub struct SseStream {
    status: StatusCode,
    body: Option<Body>,
    config: StreamConfig,
    last_event_id: Bytes,
    state: StreamState,
}

impl std::fmt::Debug for SseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseStream")
            .field("status", &self.status)
            .field("config", &self.config)
            .field("last_event_id", &self.last_event_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SseStream {
    /// Bind a stream to a reqwest response.
    pub fn from_response(response: reqwest::Response, config: StreamConfig) -> Self {
        let status = response.status();
        let body = response.bytes_stream().map_err(std::io::Error::other);
        Self::from_parts(status, StreamReader::new(Box::pin(body)), config)
    }

    /// Bind a stream to a status and any async body.
    pub fn from_parts(
        status: StatusCode,
        body: impl AsyncRead + Send + Unpin + 'static,
        config: StreamConfig,
    ) -> Self {
        Self {
            status,
            body: Some(Box::new(body)),
            config,
            last_event_id: Bytes::new(),
            state: StreamState::Created,
        }
    }

    /// Seed the sticky id, e.g. with the last id seen on a previous
    /// connection.
    pub fn with_last_event_id(mut self, id: impl Into<Bytes>) -> Self {
        self.last_event_id = id.into();
        self
    }

    /// The last non-empty event id seen. Updated when `subscribe` returns.
    pub fn last_event_id(&self) -> &Bytes {
        &self.last_event_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// HTTP status of the bound response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Stream configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Consume the stream, calling `handler` once per event in arrival
    /// order.
    ///
    /// Returns `Ok(())` when the server closes the stream, or the first
    /// fatal error. Frames that fail to parse are logged and skipped.
    /// Cancelling `cancel` interrupts a pending network read and returns
    /// [`SseError::Cancelled`]. The response body is released on every exit
    /// path, including a panicking handler or a dropped future.
    pub async fn subscribe<F>(&mut self, cancel: CancellationToken, mut handler: F) -> Result<()>
    where
        F: FnMut(Event),
    {
        let Some(body) = self.body.take() else {
            return Err(SseError::AlreadySubscribed);
        };

        if !self.status.is_success() {
            drop(body);
            self.state = StreamState::Failed;
            warn!(status = self.status.as_u16(), "Stream rejected before reading");
            return Err(SseError::Connection {
                status: self.status.as_u16(),
                reason: self
                    .status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }

        self.state = StreamState::Connected;
        info!(status = self.status.as_u16(), "Stream connected");

        let loop_token = cancel.child_token();
        let guard = loop_token.clone().drop_guard();
        let (tx, mut rx) = mpsc::channel(1);

        let read_loop = ReadLoop {
            decoder: Decoder {
                encoding_base64: self.config.encoding_base64,
                last_event_id: self.last_event_id.clone(),
            },
            cancel: loop_token,
            tx,
            frames: 0,
            delivered: 0,
        };
        let reader = FrameReader::new(body, self.config.buffer_size);
        let handle = tokio::spawn(read_loop.run(reader));
        self.state = StreamState::Draining;
        let state = StateGuard(&mut self.state);

        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Err(SseError::Cancelled),
                message = rx.recv() => match message {
                    Some(LoopMessage::Event(event, ack)) => {
                        handler(event);
                        // the loop may already be gone on cancellation
                        let _ = ack.send(());
                    }
                    Some(LoopMessage::Terminated(result)) => break result,
                    None => break Err(SseError::ReadLoop(
                        "read loop exited without a result".to_string(),
                    )),
                },
            }
        };

        drop(guard);
        drop(rx);
        let result = match handle.await {
            Ok(last_event_id) => {
                self.last_event_id = last_event_id;
                result
            }
            Err(e) => {
                warn!(error = %e, "Read loop task failed");
                result.and(Err(SseError::ReadLoop(e.to_string())))
            }
        };

        state.finish(if result.is_ok() {
            StreamState::Closed
        } else {
            StreamState::Failed
        });
        result
    }
}

/// Marks a draining stream as failed if `subscribe` unwinds or its future
/// is dropped before the loop finishes.
struct StateGuard<'a>(&'a mut StreamState);

impl StateGuard<'_> {
    fn finish(self, state: StreamState) {
        *self.0 = state;
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        if *self.0 == StreamState::Draining {
            *self.0 = StreamState::Failed;
        }
    }
}

/// What the read loop hands to the subscriber. An event carries the
/// sender the subscriber completes once its handler has returned.
enum LoopMessage {
    Event(Event, oneshot::Sender<()>),
    Terminated(Result<()>),
}

/// Frame to deliverable event, carrying the sticky id.
struct Decoder {
    encoding_base64: bool,
    last_event_id: Bytes,
}

impl Decoder {
    /// Parse a frame and apply the sticky-id rule.
    ///
    /// Returns `None` for frames that are dropped: empty, malformed, or
    /// without content. A content-free frame still updates the sticky id.
    fn decode(&mut self, frame: &[u8]) -> Option<Event> {
        let mut event = match parse_frame(frame, self.encoding_base64) {
            Ok(event) => event,
            Err(ParseError::Empty) => {
                debug!("Skipping empty frame");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed event");
                return None;
            }
        };

        if event.id.is_empty() {
            event.id = self.last_event_id.clone();
        } else {
            self.last_event_id = event.id.clone();
        }

        if !event.has_content() {
            trace!("Skipping event without content");
            return None;
        }
        Some(event)
    }
}

struct ReadLoop {
    decoder: Decoder,
    cancel: CancellationToken,
    tx: mpsc::Sender<LoopMessage>,
    frames: usize,
    delivered: usize,
}

impl ReadLoop {
    /// Drive the loop to completion and return the final sticky id.
    async fn run(mut self, mut reader: FrameReader<Body>) -> Bytes {
        let result = self.drain(&mut reader).await;
        drop(reader);

        match &result {
            Ok(()) => debug!(
                frames = self.frames,
                delivered = self.delivered,
                "Stream reached end of body"
            ),
            Err(SseError::Cancelled) => debug!(
                frames = self.frames,
                delivered = self.delivered,
                "Stream read loop cancelled"
            ),
            Err(e) => warn!(
                error = %e,
                frames = self.frames,
                delivered = self.delivered,
                "Stream read loop failed"
            ),
        }

        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = self.tx.send(LoopMessage::Terminated(result)) => {}
        }
        self.decoder.last_event_id
    }

    async fn drain(&mut self, reader: &mut FrameReader<Body>) -> Result<()> {
        loop {
            let frame = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(SseError::Cancelled),
                frame = reader.read_frame() => frame?,
            };
            let Some(frame) = frame else {
                return Ok(());
            };
            self.frames += 1;

            let Some(event) = self.decoder.decode(&frame) else {
                continue;
            };

            let (ack_tx, ack_rx) = oneshot::channel();
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(SseError::Cancelled),
                sent = self.tx.send(LoopMessage::Event(event, ack_tx)) => {
                    if sent.is_err() {
                        // subscriber is gone
                        return Err(SseError::Cancelled);
                    }
                }
            }
            // no further read until the handler is done with this event
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(SseError::Cancelled),
                acked = ack_rx => {
                    if acked.is_err() {
                        return Err(SseError::Cancelled);
                    }
                }
            }
            self.delivered += 1;
        }
    }
}
