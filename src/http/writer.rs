use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::ResponseHead;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes a status line, headers and optional body.
pub fn serialize_response(head: &ResponseHead, body: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(256 + body.len());

    buf.put_slice(
        format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            head.status.as_u16(),
            head.status.reason_phrase()
        )
        .as_bytes(),
    );

    for (k, v) in &head.headers {
        buf.put_slice(k.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(v.as_bytes());
        buf.put_slice(b"\r\n");
    }

    // Header/body separator
    buf.put_slice(b"\r\n");
    buf.put_slice(body);

    buf
}

/// Writes one response to the stream.
pub async fn write_response<W>(stream: &mut W, head: &ResponseHead, body: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let buf = serialize_response(head, body);
    stream.write_all(&buf).await?;
    stream.flush().await
}
