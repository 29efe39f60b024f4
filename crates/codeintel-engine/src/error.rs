//! Engine error types.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while talking to the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine is not running or has gone away.
    #[error("Engine unavailable")]
    Unavailable,

    /// Engine process could not be started.
    #[error("Failed to start engine: {0}")]
    Spawn(String),

    /// The connection closed before a response arrived.
    #[error("Engine connection closed")]
    Closed,

    /// Malformed message on the wire.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The engine answered with an error.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a request failed error.
    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::RequestFailed(message.into())
    }
}
