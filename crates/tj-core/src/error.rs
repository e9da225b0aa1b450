//! Error types for tj-core

use thiserror::Error;

/// Core error type for the trade journal
#[derive(Error, Debug)]
pub enum CoreError {
    /// J001: Configuration file not found
    #[error("[J001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// J002: Failed to parse configuration file
    #[error("[J002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// J003: Invalid configuration value
    #[error("[J003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// IO error with file path context
    #[error("IO error at {path}: {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
