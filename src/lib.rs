//! spysrv - a minimal TCP server.
//!
//! Either hands every connection to an external program, or serves static
//! files over a small subset of HTTP/1.1 with a fixed pool of workers.

pub mod config;
pub mod error;
pub mod http;
pub mod server;
