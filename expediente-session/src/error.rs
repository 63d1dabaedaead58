//! Error types for expediente-session

use thiserror::Error;

/// Result type alias using SessionError
pub type Result<T> = std::result::Result<T, SessionError>;

/// Session and configuration errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(String),

    /// Core library error
    #[error(transparent)]
    Core(#[from] expediente_core::Error),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Json(err.to_string())
    }
}

impl SessionError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        SessionError::InvalidConfig(msg.into())
    }
}
