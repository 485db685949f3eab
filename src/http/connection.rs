use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::http::files::{reply_text, serve_file};
use crate::http::headers::{read_message_headers, RawHeaderBlock};
use crate::http::reader::BufferedStream;
use crate::http::request::{extract_path, Method, RequestLine};
use crate::http::response::StatusCode;

/// One accepted connection and its read buffer.
///
/// A connection serves exactly one request and is then closed.
pub struct Connection<S> {
    io: BufferedStream<S>,
    label: String,
}

/// Steps of serving a single request.
#[derive(Debug)]
pub enum ServeState {
    AwaitHeaders,
    ParseRequestLine(RawHeaderBlock),
    ExtractPath(RequestLine),
    ServeFile(String),
    Done,
}

impl<S> Connection<S> {
    pub fn new(stream: S, label: impl Into<String>) -> Self {
        Self {
            io: BufferedStream::new(stream),
            label: label.into(),
        }
    }

    /// Diagnostic name of the connection, e.g. the worker serving it.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stream_mut(&mut self) -> &mut S {
        self.io.get_mut()
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads one request and answers it from `www_root`.
    ///
    /// A request head that cannot be parsed gets no reply at all.
    pub async fn serve_http(&mut self, www_root: &str) {
        let mut state = ServeState::AwaitHeaders;

        loop {
            state = match state {
                ServeState::AwaitHeaders => match read_message_headers(&mut self.io).await {
                    Ok(Some(block)) => ServeState::ParseRequestLine(block),
                    Ok(None) => {
                        debug!(connection = %self.label, "no request received");
                        ServeState::Done
                    }
                    Err(e) => {
                        warn!(connection = %self.label, error = %e, "dropping malformed request");
                        ServeState::Done
                    }
                },

                ServeState::ParseRequestLine(block) => {
                    let request_line = RequestLine::parse(block.request_line());
                    if request_line.method() != Method::Get {
                        reply_text(self, StatusCode::METHOD_NOT_ALLOWED, "Only GET is supported").await;
                    }
                    // the protocol version is not checked
                    ServeState::ExtractPath(request_line)
                }

                ServeState::ExtractPath(request_line) => {
                    let path = extract_path(Some(request_line.target.as_str()));
                    ServeState::ServeFile(path.to_string())
                }

                ServeState::ServeFile(path) => {
                    info!(connection = %self.label, url = %path, "serving url");
                    serve_file(self, StatusCode::OK, &path, www_root).await;
                    ServeState::Done
                }

                ServeState::Done => break,
            };
        }
    }

    /// Shuts the stream down, logging any failure.
    pub async fn close(mut self) {
        if let Err(e) = self.io.get_mut().shutdown().await {
            error!(connection = %self.label, error = %e, "close failed");
        }
    }
}
