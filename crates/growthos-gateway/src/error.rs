//! Error types for the WebSocket gateway.

use std::io;

/// Errors produced by the WebSocket gateway.
///
/// None of these reach an observer: a failing connection is logged and
/// dropped, and the server keeps accepting.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Socket bind or accept failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// `WebSocket` handshake or transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for GatewayError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
