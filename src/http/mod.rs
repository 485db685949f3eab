//! Minimal HTTP/1.1 static file serving.
//!
//! Only `GET` is supported and every connection carries exactly one request:
//! there is no keep-alive, no request body and no chunked transfer.
//!
//! # Architecture
//!
//! - **`reader`**: fixed-size buffered reader yielding CR LF terminated lines
//! - **`headers`**: collects and folds the lines of a request head
//! - **`request`**: request line tokens, methods and path extraction
//! - **`response`**: status codes and ordered response heads
//! - **`writer`**: serializes a response head onto the stream
//! - **`files`**: file and plain-text replies
//! - **`connection`**: the per-connection state machine
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │   AwaitHeaders   │ ← read lines up to the blank line
//!        └────────┬─────────┘
//!                 │ head parsed         (parse failure → Done, no reply)
//!                 ▼
//!        ┌──────────────────┐
//!        │ ParseRequestLine │ ← non-GET gets a 405, then carries on
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │   ExtractPath    │
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │    ServeFile     │ ← file body or 400 on open failure
//!        └────────┬─────────┘
//!                 ▼
//!               Done
//! ```
//!
//! # Example
//!
//! ```ignore
//! use spysrv::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, "example");
//!             conn.serve_http("/srv/www").await;
//!             conn.close().await;
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod files;
pub mod headers;
pub mod reader;
pub mod request;
pub mod response;
pub mod writer;
