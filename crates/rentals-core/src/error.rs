//! Error types for rentals-core

use thiserror::Error;

use crate::config::ConfigError;
use crate::remote::RemoteError;

/// Result type alias using rentals-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rentals-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bad input shape or value; never queued
    #[error("Invalid listing: {0}")]
    Validation(String),

    /// Referenced listing does not exist; never queued or retried
    #[error("Listing not found: {0}")]
    NotFound(String),

    /// Listing id already taken
    #[error("Listing conflict: {0}")]
    Conflict(String),

    /// Timeout, refused connection, or non-2xx from a reachable server
    #[error("Network error: {0}")]
    Network(String),

    /// The persistent key-value capability cannot be read or written
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        Self::StorageUnavailable(error.to_string())
    }
}

impl From<RemoteError> for Error {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::Validation(message) => Self::Validation(message),
            RemoteError::NotFound(message) => Self::NotFound(message),
            RemoteError::Conflict(message) => Self::Conflict(message),
            RemoteError::Unavailable(message) => Self::Network(message),
        }
    }
}
