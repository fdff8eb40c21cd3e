//! Error types for the transport layer.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur in transport operations.
///
/// Transport-level failures are distinct from zero-result success: a
/// request that reaches the server and comes back without the expected
/// payload is not a transport error.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success response from the server.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Channel closed.
    #[error("channel closed")]
    ChannelClosed,

    /// Timeout.
    #[error("operation timed out")]
    Timeout,
}
