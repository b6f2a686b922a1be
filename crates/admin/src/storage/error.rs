//! Storage errors.

use thiserror::Error;

/// Errors that can occur when talking to the storage account.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The addressed record, blob or file does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A record with the same row key already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The concurrency token no longer matches the stored version.
    #[error("Modified by another user: {0}")]
    PreconditionFailed(String),

    /// The connection string or account settings are unusable.
    #[error("Storage configuration error: {0}")]
    Config(String),

    /// HTTP request failed before a response was received.
    #[error("Storage request failed: {0}")]
    Request(String),

    /// A record or message could not be encoded for the service.
    #[error("Storage encoding error: {0}")]
    Encode(String),

    /// The response could not be read or decoded.
    #[error("Storage response error: {0}")]
    Response(String),

    /// The service answered with an unexpected status.
    #[error("Storage service error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Service error code and message.
        message: String,
    },
}

impl StorageError {
    /// Whether the error means the target does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Response(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}
