//! Frame reader: splits an async byte source into blank-line delimited frames.
//!
//! Line breaks are normalized as bytes arrive (`\r\n` and bare `\r` become
//! `\n`), so a frame handed to the parser only ever contains `\n`. Frame
//! boundaries are independent of how the source chunks its reads.

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// UTF-8 byte order mark, discarded if it opens the stream.
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Blank line terminating a frame, after normalization.
const TERMINATOR: &[u8] = b"\n\n";

/// Buffered frame scanner over an [`AsyncRead`].
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    /// Normalized bytes not yet handed out.
    buf: BytesMut,
    /// Current buffer size target; doubles whenever it fills up.
    capacity: usize,
    /// Length of the prefix of `buf` already searched for a terminator.
    scanned: usize,
    /// The last raw byte ingested was `\r`.
    last_was_cr: bool,
    bom_pending: bool,
    eof: bool,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Create a reader with the given initial buffer size.
    pub fn new(inner: R, buffer_size: usize) -> Self {
        let capacity = buffer_size.max(TERMINATOR.len());
        Self {
            inner,
            buf: BytesMut::with_capacity(capacity),
            capacity,
            scanned: 0,
            last_was_cr: false,
            bom_pending: true,
            eof: false,
        }
    }

    /// Read the next frame, without its terminator.
    ///
    /// Returns `Ok(None)` once the source is exhausted. Bytes left over at
    /// end of stream are returned as a final frame unless they are only line
    /// breaks.
    pub async fn read_frame(&mut self) -> std::io::Result<Option<Bytes>> {
        loop {
            if let Some(frame) = self.take_frame() {
                return Ok(Some(frame));
            }
            if self.eof {
                return Ok(self.take_tail());
            }
            self.fill().await?;
        }
    }

    /// Current buffer size target.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Give back the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    async fn fill(&mut self) -> std::io::Result<()> {
        if self.buf.len() >= self.capacity {
            while self.buf.len() >= self.capacity {
                self.capacity *= 2;
            }
            tracing::trace!(capacity = self.capacity, "growing frame buffer");
        }
        self.buf.reserve(self.capacity - self.buf.len());

        let start = self.buf.len();
        let n = self.inner.read_buf(&mut self.buf).await?;
        if n == 0 {
            self.eof = true;
            return Ok(());
        }
        self.normalize_from(start);
        self.strip_bom();
        Ok(())
    }

    /// Rewrite line breaks in `buf[start..]` to plain `\n`, in place.
    fn normalize_from(&mut self, start: usize) {
        let mut write = start;
        for read in start..self.buf.len() {
            let byte = self.buf[read];
            match byte {
                b'\r' => {
                    self.buf[write] = b'\n';
                    write += 1;
                    self.last_was_cr = true;
                }
                b'\n' if self.last_was_cr => {
                    // second half of a CRLF
                    self.last_was_cr = false;
                }
                _ => {
                    self.buf[write] = byte;
                    write += 1;
                    self.last_was_cr = false;
                }
            }
        }
        self.buf.truncate(write);
    }

    fn strip_bom(&mut self) {
        if !self.bom_pending {
            return;
        }
        if self.buf.len() >= BOM.len() {
            if self.buf.starts_with(BOM) {
                self.buf.advance(BOM.len());
                self.scanned = 0;
            }
            self.bom_pending = false;
        } else if !BOM.starts_with(&self.buf) {
            self.bom_pending = false;
        }
    }

    fn take_frame(&mut self) -> Option<Bytes> {
        let from = self
            .scanned
            .saturating_sub(TERMINATOR.len() - 1)
            .min(self.buf.len());
        match find_terminator(&self.buf[from..]) {
            Some(pos) => {
                let frame = self.buf.split_to(from + pos).freeze();
                self.buf.advance(TERMINATOR.len());
                self.scanned = 0;
                Some(frame)
            }
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }

    fn take_tail(&mut self) -> Option<Bytes> {
        self.scanned = 0;
        if self.buf.iter().all(|&b| b == b'\n') {
            self.buf.clear();
            return None;
        }
        Some(self.buf.split().freeze())
    }
}

fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(TERMINATOR.len())
        .position(|window| window == TERMINATOR)
}
