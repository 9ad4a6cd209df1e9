//! # Store Errors
//!
//! Typed conditions returned by the record store. Callers branch on the
//! variant, never on the message text.

use std::time::Duration;

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Record store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    // ==================
    // Record Conditions
    // ==================
    /// Identifier absent, or non-positive and never looked up
    #[error("record not found")]
    NotFound,

    /// Conditional update matched no row: the stored version moved on or the
    /// record is gone. Disambiguate with a prior `get`.
    #[error("edit conflict")]
    EditConflict,

    // ==================
    // Transient Failures
    // ==================
    /// The storage call exceeded its deadline and was abandoned
    #[error("storage call timed out after {after:?}")]
    Timeout { after: Duration },

    /// The storage call was cancelled before it completed
    #[error("storage call cancelled")]
    Cancelled,

    /// The storage backend reported a failure
    #[error("storage backend error: {0}")]
    Backend(String),

    // ==================
    // Internal Failures
    // ==================
    /// A row did not have the expected shape
    #[error("malformed row: {0}")]
    Malformed(String),
}

impl StoreError {
    /// Whether a caller may retry the same call later.
    ///
    /// Edit conflicts are never transient: the caller must re-read first.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Timeout { .. } | StoreError::Cancelled | StoreError::Backend(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Timeout {
            after: Duration::from_secs(3)
        }
        .is_transient());
        assert!(StoreError::Cancelled.is_transient());
        assert!(StoreError::Backend("disk I/O error".to_string()).is_transient());

        assert!(!StoreError::EditConflict.is_transient());
        assert!(!StoreError::NotFound.is_transient());
        assert!(!StoreError::Malformed("bad".to_string()).is_transient());
    }

    #[test]
    fn test_timeout_is_not_a_conflict() {
        let err = StoreError::Timeout {
            after: Duration::from_secs(3),
        };
        assert!(!matches!(err, StoreError::EditConflict));
        assert!(err.to_string().contains("timed out"));
    }
}
