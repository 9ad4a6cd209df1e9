//! # Admission Errors
//!
//! Failures of the admission layer itself. A denied request is not an
//! error: `admit` returns `false` for it.

use thiserror::Error;

/// Result type for admission operations
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// Admission control errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// The request carried no client address to key on
    #[error("client address unavailable")]
    MissingClientAddress,

    /// The client address could not be parsed into a stable key
    #[error("malformed client address: {0:?}")]
    MalformedClientAddress(String),

    /// Limiter settings are unusable
    #[error("invalid rate limiter configuration: {0}")]
    InvalidConfig(String),
}
