//! Error types for the CLI client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// User ID rejected before connecting
    #[error("Invalid user ID '{0}': {1}")]
    InvalidUserId(String, String),

    /// Could not open the WebSocket connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// An established connection was lost
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Gave up after repeated failures
    #[error("Failed to reconnect after {0} attempts")]
    ReconnectExhausted(u32),
}
