//! Error types for the WebSocket client.

use thiserror::Error;

/// Errors surfaced by [`WebSocketClient`](super::WebSocketClient).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DuplexError {
    /// The opening handshake failed; no client was created.
    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),

    /// The connection is closed or closing.
    #[error("WebSocket is not open")]
    NotOpen,

    /// Writing a frame failed.
    #[error("WebSocket send failed: {0}")]
    Send(String),
}
