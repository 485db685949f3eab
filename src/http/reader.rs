//! Line-oriented buffered reader over a raw stream.
//!
//! One fixed-size buffer per connection amortizes read syscalls across the
//! many short lines of a request head. Bytes in `buf[read_pos..end_pos]`
//! have been read from the stream but not yet handed to the parser.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ParseError;

/// Capacity of the per-connection read buffer.
pub const BUF_SIZE: usize = 8192;

pub struct BufferedStream<S> {
    stream: S,
    buf: Box<[u8]>,
    read_pos: usize,
    end_pos: usize,
}

impl<S> BufferedStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: vec![0u8; BUF_SIZE].into_boxed_slice(),
            read_pos: 0,
            end_pos: 0,
        }
    }

    /// Number of buffered bytes not yet consumed.
    pub fn available(&self) -> usize {
        self.end_pos - self.read_pos
    }

    /// Direct access to the stream, used for writing responses.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}

impl<S: AsyncRead + Unpin> BufferedStream<S> {
    /// Returns the unconsumed byte count if there is any. Otherwise performs
    /// exactly one read of up to `BUF_SIZE` bytes and rewinds the cursors.
    /// `Ok(0)` means the peer closed the stream.
    pub async fn fill_buffer(&mut self) -> std::io::Result<usize> {
        let available = self.available();
        if available > 0 {
            return Ok(available);
        }

        let n = self.stream.read(&mut self.buf).await?;
        self.read_pos = 0;
        self.end_pos = n;
        Ok(n)
    }

    /// Reads one CR LF terminated line, returning it without the terminator.
    ///
    /// Returns `Ok(None)` when the stream ends before a terminator. A line
    /// fits if its content plus CR LF is at most `max_len` bytes; anything
    /// longer is rejected instead of truncated.
    pub async fn read_line(&mut self, max_len: usize) -> Result<Option<Vec<u8>>, ParseError> {
        let mut line = Vec::new();
        let mut prev = 0u8;
        let mut consumed = 0;

        loop {
            if consumed >= max_len {
                return Err(ParseError::LineTooLong(max_len));
            }
            if self.available() == 0 && self.fill_buffer().await? == 0 {
                return Ok(None);
            }

            let byte = self.buf[self.read_pos];
            self.read_pos += 1;
            consumed += 1;

            if prev == b'\r' && byte == b'\n' {
                line.pop();
                return Ok(Some(line));
            }
            line.push(byte);
            prev = byte;
        }
    }
}
