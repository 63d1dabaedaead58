//! Error types for expediente-core

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Remote store unreachable or rejected credentials; retryable
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller-visible validation failure naming the offending item
    #[error("Validation error: {0}")]
    Validation(String),

    /// Text or tabular decoding failure
    #[error("Decode error: {0}")]
    Decode(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Create a connectivity error
    pub fn connectivity(msg: impl Into<String>) -> Self {
        Error::Connectivity(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }

    /// Create an I/O error
    pub fn io(msg: impl Into<String>) -> Self {
        Error::Io(msg.into())
    }

    /// True for the NotFound variant, which callers routinely downgrade
    /// to "absent" (missing dataset file, missing document).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
