//! Rate Limiter Configuration
//!
//! Per-client token bucket settings and the idle-eviction schedule.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{AdmissionError, AdmissionResult};

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Whether admission control runs at all (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Sustained tokens per second per client (default: 2.0)
    #[serde(default = "default_rps")]
    pub rps: f64,

    /// Bucket capacity per client (default: 4)
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// How often idle clients are swept (default: 60)
    #[serde(default = "default_sweep_period_secs")]
    pub sweep_period_secs: u64,

    /// Idle time after which a client is evicted (default: 180)
    #[serde(default = "default_idle_threshold_secs")]
    pub idle_threshold_secs: u64,

    /// Read the client address from this header instead of the peer address
    #[serde(default)]
    pub client_ip_header: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_rps() -> f64 {
    2.0
}

fn default_burst() -> u32 {
    4
}

fn default_sweep_period_secs() -> u64 {
    60
}

fn default_idle_threshold_secs() -> u64 {
    180
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            rps: default_rps(),
            burst: default_burst(),
            sweep_period_secs: default_sweep_period_secs(),
            idle_threshold_secs: default_idle_threshold_secs(),
            client_ip_header: None,
        }
    }
}

impl LimiterConfig {
    /// Config with admission control switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn sweep_period(&self) -> Duration {
        Duration::from_secs(self.sweep_period_secs)
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_secs)
    }

    /// The idle threshold must exceed the sweep period, otherwise a client
    /// in the middle of a slow burst could be evicted between two requests.
    pub fn validate(&self) -> AdmissionResult<()> {
        if !self.rps.is_finite() || self.rps <= 0.0 {
            return Err(AdmissionError::InvalidConfig(format!(
                "rps must be a positive number, got {}",
                self.rps
            )));
        }
        if self.burst == 0 {
            return Err(AdmissionError::InvalidConfig("burst must be >= 1".to_string()));
        }
        if self.sweep_period_secs == 0 {
            return Err(AdmissionError::InvalidConfig(
                "sweep_period_secs must be > 0".to_string(),
            ));
        }
        if self.idle_threshold_secs <= self.sweep_period_secs {
            return Err(AdmissionError::InvalidConfig(format!(
                "idle_threshold_secs ({}) must exceed sweep_period_secs ({})",
                self.idle_threshold_secs, self.sweep_period_secs
            )));
        }
        if let Some(header) = &self.client_ip_header {
            if header.parse::<axum::http::HeaderName>().is_err() {
                return Err(AdmissionError::InvalidConfig(format!(
                    "client_ip_header {header:?} is not a valid header name"
                )));
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
        let config = LimiterConfig::default();
        assert!(config.enabled);
        assert_eq!(config.rps, 2.0);
        assert_eq!(config.burst, 4);
        assert_eq!(config.sweep_period(), Duration::from_secs(60));
        assert_eq!(config.idle_threshold(), Duration::from_secs(180));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_must_exceed_period() {
        let config = LimiterConfig {
            sweep_period_secs: 60,
            idle_threshold_secs: 60,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AdmissionError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_unusable_rates() {
        for rps in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = LimiterConfig {
                rps,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "rps {rps} accepted");
        }

        let config = LimiterConfig {
            burst: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_header_name() {
        let config = LimiterConfig {
            client_ip_header: Some("not a header".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
