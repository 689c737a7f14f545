//! Error types for sni-ranges
//!
//! This module provides the error taxonomy for the fetch pipeline:
//! - Transport failures (connect, DNS, timeout) and non-2xx statuses, both retried
//! - Body read failures after a successful status, also retried
//! - Configuration errors, raised before any dispatch begins
//! - Sink and worker failures, which end the affected fetch without retry

use thiserror::Error;

/// Result type alias for sni-ranges operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sni-ranges
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "concurrency")
        key: Option<String>,
    },

    /// Connection, DNS, or timeout failure while issuing the request
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The source answered with a non-2xx status
    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus {
        /// The address that was requested
        url: String,
        /// Numeric status code of the response
        status: u16,
    },

    /// Reading the response body failed after a 2xx status
    #[error("stream read error: {0}")]
    StreamRead(#[source] std::io::Error),

    /// The output sink rejected a write
    #[error("sink write error: {0}")]
    Sink(#[source] std::io::Error),

    /// I/O error outside of a source stream (config files, stdin)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The task fetching one address panicked or was aborted
    #[error("worker failed: {0}")]
    Worker(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code, stable across releases
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Transport(e) if e.is_timeout() => "timeout",
            Error::Transport(e) if e.is_connect() => "connect_error",
            Error::Transport(_) => "transport_error",
            Error::HttpStatus { .. } => "http_status",
            Error::StreamRead(_) => "stream_read_error",
            Error::Sink(_) => "sink_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Worker(_) => "worker_error",
            Error::Other(_) => "internal_error",
        }
    }

    /// Returns true for configuration errors
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config { .. })
    }
}
