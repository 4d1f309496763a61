//! Reporter error types.

use thiserror::Error;

/// Errors that can occur while constructing a reporter or delivering lines.
///
/// Configuration errors (`InvalidUrl`) are fatal at construction time.
/// Everything else is transient: the delivery strategies catch these at
/// their boundary, log them, and drop the affected batch so a bad cycle
/// never reaches the scheduler.
#[derive(Debug, Error)]
pub enum ReporterError {
    /// Server value is not an absolute URL with a scheme and host
    #[error("invalid server url: {0}")]
    InvalidUrl(String),

    /// Connection to the proxy failed
    #[error("connection failed to {target}: {source}")]
    ConnectionFailed {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Write to an established proxy connection failed
    #[error("write failed: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// Connect or write did not complete within the configured timeout
    #[error("operation timed out")]
    Timeout,

    /// No live connection after a connect attempt
    #[error("no connection to proxy")]
    NoConnection,

    /// HTTP request could not be sent
    #[error("request error: {0}")]
    Request(String),

    /// Ingestion endpoint returned a non-2xx status
    #[error("server error: HTTP {0}")]
    Server(u16),
}
