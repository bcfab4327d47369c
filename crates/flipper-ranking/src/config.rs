//! Configuration management for the ranking client

use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Scoring service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Status endpoint of the scoring service
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    std::env::var("FLIPPER_API_URL")
        .unwrap_or_else(|_| "https://api.xflipper.io/collection".to_string())
}

fn default_timeout() -> u64 {
    30
}

/// Polling loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    /// Delay between status requests while a job is pending
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
        }
    }
}

impl PollerConfig {
    /// Poll delay; never shorter than one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }
}

fn default_interval() -> u64 {
    5
}

/// Paging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Delay applied to page changes before they take effect
    #[serde(default = "default_page_change_delay")]
    pub page_change_delay_ms: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            page_change_delay_ms: default_page_change_delay(),
        }
    }
}

impl ViewConfig {
    pub fn page_change_delay(&self) -> Duration {
        Duration::from_millis(self.page_change_delay_ms)
    }
}

fn default_page_size() -> usize {
    flipper_core::DEFAULT_PAGE_SIZE
}

fn default_page_change_delay() -> u64 {
    1000
}

/// Session used by the headless binary
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub wallet_address: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub contract_address: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            // Start with defaults
            .set_default("scoring.api_url", default_api_url())?
            .set_default("scoring.timeout_seconds", default_timeout() as i64)?
            .set_default("poller.interval_seconds", default_interval() as i64)?
            .set_default("view.page_size", default_page_size() as i64)?
            .set_default("view.page_change_delay_ms", default_page_change_delay() as i64)?
            .set_default("session.wallet_address", "")?
            .set_default("session.signature", "")?
            .set_default("session.contract_address", "")?
            // Load from file if present
            .add_source(config::File::with_name("flipper-ranking").required(false))
            // Override with environment variables (FLIPPER__SCORING__API_URL, etc.)
            .add_source(
                config::Environment::with_prefix("FLIPPER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        flipper_core::validate_page_size(config.view.page_size)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.poller.interval(), Duration::from_secs(5));
        assert_eq!(config.scoring.timeout_seconds, 30);
        assert_eq!(config.view.page_size, 10);
        assert_eq!(config.view.page_change_delay(), Duration::from_millis(1000));
        assert!(config.session.wallet_address.is_empty());
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "poller": { "interval_seconds": 0 } }"#).unwrap();
        assert_eq!(config.poller.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_sections_fall_back_to_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "poller": { "interval_seconds": 2 }, "view": { "page_size": 30 } }"#,
        )
        .unwrap();

        assert_eq!(config.poller.interval_seconds, 2);
        assert_eq!(config.view.page_size, 30);
        assert_eq!(config.view.page_change_delay_ms, 1000);
        assert_eq!(config.scoring.timeout_seconds, 30);
    }
}
