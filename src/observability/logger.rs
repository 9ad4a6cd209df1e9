//! Structured logging setup
//!
//! One `tracing` subscriber per process, writing to stdout:
//! - `json`: one JSON object per event, for log shippers
//! - `pretty`: human-readable, for development
//!
//! The level filter comes from `RUST_LOG` when set, otherwise from the
//! caller's default directive.

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::http_server::LogFormat;

use super::{ObservabilityError, ObservabilityResult};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Builds the filter, preferring `RUST_LOG` over `default_directive`.
pub fn env_filter(default_directive: &str) -> ObservabilityResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directive)
            .map_err(|e| ObservabilityError::new(format!("invalid log filter: {e}"))),
    }
}

/// Installs the global subscriber.
///
/// Fails if a subscriber is already installed; callers that may run twice
/// in one process (tests) should ignore that error.
pub fn init_logging(format: LogFormat, default_directive: &str) -> ObservabilityResult<()> {
    let filter = env_filter(default_directive)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(false)).try_init(),
    };

    installed.map_err(|e| ObservabilityError::new(format!("logger already installed: {e}")))
}
