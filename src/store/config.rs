//! Store Configuration
//!
//! Database location and the deadlines applied to every storage call.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Path value that opens a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file (default: "coinvault.db")
    #[serde(default = "default_path")]
    pub path: String,

    /// Deadline for a single storage round trip (default: 3000)
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// How long SQLite waits on a locked database file (default: 5000)
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_path() -> String {
    "coinvault.db".to_string()
}

fn default_query_timeout_ms() -> u64 {
    3000
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            query_timeout_ms: default_query_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// In-memory configuration, used by tests and throwaway instances
    pub fn in_memory() -> Self {
        Self {
            path: IN_MEMORY_PATH.to_string(),
            ..Default::default()
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY_PATH
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("store.path must not be empty".to_string());
        }
        if self.query_timeout_ms == 0 {
            return Err("store.query_timeout_ms must be > 0".to_string());
        }
        Ok(())
    }
}
