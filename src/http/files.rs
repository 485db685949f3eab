//! Static file responses and plain-text replies.

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info};

use crate::http::connection::Connection;
use crate::http::response::{ResponseHead, StatusCode};
use crate::http::writer::write_response;

/// Sends a complete `text/plain` response carrying `message`.
pub async fn reply_text<S>(conn: &mut Connection<S>, status: StatusCode, message: &str)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let head = ResponseHead::new(status, conn.label()).header("Content-Type", "text/plain");
    let body = format!("{message}\r\n");

    if let Err(e) = write_response(conn.stream_mut(), &head, body.as_bytes()).await {
        error!(connection = %conn.label(), error = %e, "write failed");
    }
}

/// Sends the file at `root` + `path`, or a 400 reply if it cannot be opened.
///
/// No `Content-Type` is set. The body transfer is fire-and-forget: a failure
/// half-way leaves the client with a truncated body.
pub async fn serve_file<S>(conn: &mut Connection<S>, status: StatusCode, path: &str, root: &str)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let abs_path = format!("{root}{path}");

    let mut file = match File::open(&abs_path).await {
        Ok(file) => file,
        Err(e) => {
            info!(connection = %conn.label(), path = %abs_path, error = %e, "open failed");
            reply_text(conn, StatusCode::BAD_REQUEST, &format!("open failed: {e}")).await;
            return;
        }
    };

    let head = ResponseHead::new(status, conn.label());
    if let Err(e) = write_response(conn.stream_mut(), &head, &[]).await {
        error!(connection = %conn.label(), error = %e, "write failed");
        return;
    }

    match tokio::io::copy(&mut file, conn.stream_mut()).await {
        Ok(bytes) => debug!(connection = %conn.label(), bytes, "file sent"),
        Err(e) => debug!(connection = %conn.label(), error = %e, "file transfer cut short"),
    }
}
