//! Error types for face comparison.

use std::fmt;

pub type CompareResult<T> = Result<T, CompareError>;

/// Errors reported by the face comparison service.
#[derive(Debug)]
pub enum CompareError {
    /// The service rejected one of the images (undecodable, too large, or
    /// without a detectable face).
    InvalidImage { reason: String },

    /// Transport, credential or service-side failure.
    Service { source: anyhow::Error },
}

impl fmt::Display for CompareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareError::InvalidImage { reason } => write!(f, "Invalid image: {}", reason),
            CompareError::Service { source } => {
                write!(f, "Face comparison service error: {}", source)
            }
        }
    }
}

impl std::error::Error for CompareError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompareError::Service { source } => Some(source.as_ref()),
            CompareError::InvalidImage { .. } => None,
        }
    }
}
