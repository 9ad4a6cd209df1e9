//! Service configuration file
//!
//! A single JSON document with one section per subsystem. Every field has a
//! default, so `{}` is a valid configuration:
//!
//! ```json
//! {
//!   "server":  { "port": 4000, "env": "development", "log_format": "pretty" },
//!   "store":   { "path": "coinvault.db", "query_timeout_ms": 3000 },
//!   "limiter": { "enabled": true, "rps": 2.0, "burst": 4 },
//!   "auth":    { "tokens": [{ "token": "...", "user": "ana", "permissions": ["coins:read"] }] }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::admission::LimiterConfig;
use crate::auth::AuthConfig;
use crate::http_server::HttpServerConfig;
use crate::store::StoreConfig;

use super::args::ConfigOverrides;
use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub limiter: LimiterConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from file.
    ///
    /// Only parses; callers validate once command-line overrides are applied.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))
    }

    /// Applies command-line overrides on top of the loaded values.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(db) = &overrides.db {
            self.store.path = db.clone();
        }
        if let Some(enabled) = overrides.limiter_enabled {
            self.limiter.enabled = enabled;
        }
        if let Some(rps) = overrides.limiter_rps {
            self.limiter.rps = rps;
        }
        if let Some(burst) = overrides.limiter_burst {
            self.limiter.burst = burst;
        }
    }

    /// Validate every section
    pub fn validate(&self) -> CliResult<()> {
        self.server.validate().map_err(CliError::config_error)?;
        self.store.validate().map_err(CliError::config_error)?;
        self.limiter
            .validate()
            .map_err(|e| CliError::config_error(e.to_string()))?;
        self.auth
            .validate()
            .map_err(|e| CliError::config_error(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("coinvault.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&write_config(&dir, "{}")).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.store.path, "coinvault.db");
        assert!(config.limiter.enabled);
        assert!(config.auth.tokens.is_empty());
    }

    #[test]
    fn test_sections_are_read() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{
                "server": {"port": 9000, "env": "staging"},
                "store": {"path": ":memory:", "query_timeout_ms": 500},
                "limiter": {"rps": 10.0, "burst": 20, "client_ip_header": "x-real-ip"},
                "auth": {"tokens": [{"token": "t1", "user": "ana", "permissions": ["coins:read"]}]}
            }"#,
        );
        let config = Config::load(&path).unwrap();

        assert_eq!(config.server.port, 9000);
        assert!(config.store.is_in_memory());
        assert_eq!(config.limiter.burst, 20);
        assert_eq!(config.limiter.client_ip_header.as_deref(), Some("x-real-ip"));
        assert_eq!(config.auth.tokens[0].user, "ana");
    }

    #[test]
    fn test_invalid_limiter_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{"limiter": {"sweep_period_secs": 60, "idle_threshold_secs": 30}}"#,
        );
        let config = Config::load(&path).unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_overrides_win() {
        let mut config = Config::default();
        config.apply(&ConfigOverrides {
            port: Some(8081),
            db: Some(":memory:".to_string()),
            limiter_enabled: Some(false),
            limiter_rps: Some(5.0),
            limiter_burst: Some(9),
        });

        assert_eq!(config.server.port, 8081);
        assert!(config.store.is_in_memory());
        assert!(!config.limiter.enabled);
        assert_eq!(config.limiter.rps, 5.0);
        assert_eq!(config.limiter.burst, 9);
        assert!(config.validate().is_ok());
    }
}
