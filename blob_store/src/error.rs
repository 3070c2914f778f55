//! Error types for blob store operations.

use std::fmt;

/// Result type for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob store operations.
#[derive(Debug)]
pub enum BlobError {
    /// Object not found at the specified key.
    NotFound { key: String },

    /// Invalid storage URI or object key.
    InvalidUri { uri: String, reason: String },

    /// I/O error from the local filesystem backend.
    IoError { source: std::io::Error },

    /// Error talking to the remote object store.
    NetworkError { source: anyhow::Error },

    /// Backend not supported.
    UnsupportedBackend { scheme: String },

    /// Generic error.
    Other { source: anyhow::Error },
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobError::NotFound { key } => write!(f, "Object not found: {}", key),
            BlobError::InvalidUri { uri, reason } => {
                write!(f, "Invalid URI '{}': {}", uri, reason)
            }
            BlobError::IoError { source } => write!(f, "I/O error: {}", source),
            BlobError::NetworkError { source } => write!(f, "Network error: {}", source),
            BlobError::UnsupportedBackend { scheme } => {
                write!(f, "Unsupported backend: {}", scheme)
            }
            BlobError::Other { source } => write!(f, "Blob store error: {}", source),
        }
    }
}

impl std::error::Error for BlobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BlobError::IoError { source } => Some(source),
            BlobError::NetworkError { source } => Some(source.as_ref()),
            BlobError::Other { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BlobError {
    fn from(err: std::io::Error) -> Self {
        BlobError::IoError { source: err }
    }
}
