//! Error types shared across the crate.
//!
//! Protocol errors never take the process down: the connection handler
//! turns them into a dropped connection. Configuration errors abort startup.

use thiserror::Error;

/// Failure while reading the request head off a connection.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("message too long: no line terminator within {0} bytes")]
    LineTooLong(usize),
    #[error("too many headers (limit {0})")]
    TooManyHeaders(usize),
    #[error("unexpected eof in headers")]
    UnexpectedEof,
    #[error("header line is not valid UTF-8")]
    InvalidEncoding,
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid or unreadable server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("www_root must not end with '/': {0}")]
    TrailingSeparator(String),
    #[error("{0} must be at least 1")]
    NotPositive(&'static str),
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },
}
