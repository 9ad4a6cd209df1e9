//! Observability for coinvault
//!
//! Logging goes through `tracing`; this module only installs the
//! subscriber. Events are emitted where they happen with structured fields:
//!
//! ```ignore
//! tracing::info!(id = coin.id, version = coin.version, "coin updated");
//! ```

mod logger;

pub use logger::{env_filter, init_logging, DEFAULT_FILTER};

use std::fmt;

/// Observability error
///
/// Logging setup failures are reported to the caller, who decides whether
/// to continue without a subscriber.
#[derive(Debug)]
pub struct ObservabilityError {
    message: String,
}

impl ObservabilityError {
    /// Create a new observability error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Get the message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ObservabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observability: {}", self.message)
    }
}

impl std::error::Error for ObservabilityError {}

/// Result type for observability operations
pub type ObservabilityResult<T> = Result<T, ObservabilityError>;
