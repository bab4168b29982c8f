//! Error types for the transport layer.

use thiserror::Error;

/// A transport-level failure: the request never produced a response.
///
/// Cloneable so a single stream failure can be fanned out to both the consumer and the
/// owner of a stream.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// A connect, read or write ceiling was exceeded.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The connection could not be established (refused, DNS, TLS).
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Any other I/O failure while sending or receiving.
    #[error("I/O error: {0}")]
    Io(String),

    /// The peer answered with something the transport cannot use.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The call was cancelled by whoever held its handle.
    #[error("Cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_builder() || e.is_decode() {
            TransportError::Protocol(e.to_string())
        } else {
            TransportError::Io(e.to_string())
        }
    }
}
