//! Frame parser: turns one raw frame into an [`Event`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::{Bytes, BytesMut};

use crate::error::ParseError;
use crate::event::Event;

const HEADER_ID: &[u8] = b"id:";
const HEADER_DATA: &[u8] = b"data:";
const HEADER_EVENT: &[u8] = b"event:";
const HEADER_RETRY: &[u8] = b"retry:";
/// A line holding just this token is a data field with an empty value.
const BARE_DATA: &[u8] = b"data";

/// Parse one frame.
///
/// Lines are processed independently; `data:` lines accumulate in order,
/// the other fields keep the last value seen. Unknown fields and comments
/// are ignored. With `encoding_base64` set, the joined payload is decoded
/// as standard Base64.
pub fn parse_frame(frame: &[u8], encoding_base64: bool) -> Result<Event, ParseError> {
    if frame.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut event = Event::default();
    let mut data = BytesMut::new();

    for line in frame
        .split(|&b| b == b'\n' || b == b'\r')
        .filter(|line| !line.is_empty())
    {
        if line.starts_with(HEADER_ID) {
            event.id = Bytes::copy_from_slice(trim_header(HEADER_ID.len(), line));
        } else if line.starts_with(HEADER_DATA) {
            data.extend_from_slice(trim_header(HEADER_DATA.len(), line));
            data.extend_from_slice(b"\n");
        } else if line == BARE_DATA {
            data.extend_from_slice(b"\n");
        } else if line.starts_with(HEADER_EVENT) {
            event.event_type = Bytes::copy_from_slice(trim_header(HEADER_EVENT.len(), line));
        } else if line.starts_with(HEADER_RETRY) {
            event.retry = Bytes::copy_from_slice(trim_header(HEADER_RETRY.len(), line));
        }
    }

    if data.ends_with(b"\n") {
        data.truncate(data.len() - 1);
    }
    event.data = data.freeze();

    if encoding_base64 {
        match STANDARD.decode(&event.data) {
            Ok(decoded) => event.data = Bytes::from(decoded),
            Err(source) => {
                event.data = decode_prefix(&event.data, &source);
                return Err(ParseError::Base64 {
                    source,
                    partial: Box::new(event),
                });
            }
        }
    }

    Ok(event)
}

/// Strip a field name, then one optional leading space and one trailing
/// line break from the value.
fn trim_header(size: usize, line: &[u8]) -> &[u8] {
    if line.len() < size {
        return line;
    }
    let mut value = &line[size..];
    if let Some(rest) = value.strip_prefix(b" ") {
        value = rest;
    }
    if let Some(rest) = value.strip_suffix(b"\n") {
        value = rest;
    }
    value
}

/// Decode the whole 4-character groups in front of the point where decoding
/// failed.
fn decode_prefix(data: &[u8], error: &base64::DecodeError) -> Bytes {
    let valid = match *error {
        base64::DecodeError::InvalidByte(offset, _)
        | base64::DecodeError::InvalidLastSymbol(offset, _) => offset,
        base64::DecodeError::InvalidLength(len) => len,
        _ => 0,
    };
    let end = (valid / 4 * 4).min(data.len());
    STANDARD
        .decode(&data[..end])
        .map(Bytes::from)
        .unwrap_or_default()
}
