//! Request head parsing: collects raw header lines up to the blank line.

use tokio::io::AsyncRead;

use crate::error::ParseError;
use crate::http::reader::BufferedStream;

/// Maximum number of (unfolded) lines in a request head.
pub const MAX_HEADER_LINES: usize = 64;
/// Maximum length of a single line, CR LF included.
pub const MAX_LINE_LEN: usize = 1024;

/// The raw lines of one request head, request line first.
///
/// Continuation lines are already folded into their predecessor. A block
/// always holds at least the request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeaderBlock {
    lines: Vec<String>,
}

impl RawHeaderBlock {
    pub fn request_line(&self) -> &str {
        &self.lines[0]
    }

    /// Header lines following the request line.
    pub fn fields(&self) -> &[String] {
        &self.lines[1..]
    }

    /// Every line of the head, request line included.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

}

/// Reads header lines until the empty line that ends the head.
///
/// `Ok(None)` means there was no request at all: the peer closed the stream
/// before sending a line, or the very first line was empty.
pub async fn read_message_headers<S>(
    reader: &mut BufferedStream<S>,
) -> Result<Option<RawHeaderBlock>, ParseError>
where
    S: AsyncRead + Unpin,
{
    let mut lines: Vec<String> = Vec::new();

    loop {
        let Some(raw) = reader.read_line(MAX_LINE_LEN).await? else {
            if lines.is_empty() {
                return Ok(None);
            }
            return Err(ParseError::UnexpectedEof);
        };
        if raw.is_empty() {
            break;
        }

        let line = String::from_utf8(raw).map_err(|_| ParseError::InvalidEncoding)?;
        let first = line.as_bytes()[0];
        let has_prior = !lines.is_empty();

        // A tab folds even when there is nothing before it.
        if (has_prior && first == b' ') || first == b'\t' {
            match lines.last_mut() {
                Some(prev) => {
                    prev.push(' ');
                    prev.push_str(&line);
                }
                None => tracing::debug!(line = %line, "dropping continuation line without predecessor"),
            }
        } else {
            if lines.len() >= MAX_HEADER_LINES {
                return Err(ParseError::TooManyHeaders(MAX_HEADER_LINES));
            }
            lines.push(line);
        }
    }

    if lines.is_empty() {
        return Ok(None);
    }
    Ok(Some(RawHeaderBlock { lines }))
}
