//! Error types for the coordination layer.

use codeintel_engine::EngineError;
use thiserror::Error;

/// Core error type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Engine error.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON in a config source.
    #[error("Invalid JSON in {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// Environment variable referenced by `{env:..}` is not set.
    #[error("Environment variable not found: {name}")]
    EnvVarNotFound { name: String },

    /// File referenced by `{file:..}` does not exist.
    #[error("File reference not found: {path}")]
    FileRefNotFound { path: String },

    /// Invalid path.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidJson {
            path: "codeintel.json".to_string(),
            message: "expected `,`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid JSON in codeintel.json: expected `,`"
        );

        let err = ConfigError::EnvVarNotFound {
            name: "HOME".to_string(),
        };
        assert_eq!(err.to_string(), "Environment variable not found: HOME");
    }

    #[test]
    fn test_core_error_wraps_sources() {
        let err: CoreError = ConfigError::InvalidPath("~".to_string()).into();
        assert_eq!(err.to_string(), "Configuration error: Invalid path: ~");

        let err: CoreError = EngineError::Unavailable.into();
        assert_eq!(err.to_string(), "Engine error: Engine unavailable");
    }
}
