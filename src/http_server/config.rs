//! HTTP Server Configuration
//!
//! Bind address, operating environment, CORS origins and log format.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating environment, reported by the healthcheck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        })
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 4000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Operating environment (default: development)
    #[serde(default)]
    pub env: Environment,

    /// CORS allowed origins (default: none, CORS disabled)
    #[serde(default)]
    pub cors_trusted_origins: Vec<String>,

    /// Log output format (default: pretty)
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            env: Environment::default(),
            cors_trusted_origins: Vec::new(),
            log_format: LogFormat::default(),
        }
    }
}

impl HttpServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("server.host must not be empty".to_string());
        }
        for origin in &self.cors_trusted_origins {
            if origin.parse::<axum::http::HeaderValue>().is_err() {
                return Err(format!("invalid CORS origin: {origin:?}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 4000);
        assert_eq!(config.env, Environment::Development);
        assert!(config.cors_trusted_origins.is_empty());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_socket_addr() {
        let config = HttpServerConfig::with_port(8080);
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_unknown_env_is_rejected() {
        let result: Result<HttpServerConfig, _> =
            serde_json::from_str(r#"{"env": "qa"}"#);
        assert!(result.is_err());

        let config: HttpServerConfig =
            serde_json::from_str(r#"{"env": "production", "log_format": "json"}"#).unwrap();
        assert_eq!(config.env.to_string(), "production");
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
