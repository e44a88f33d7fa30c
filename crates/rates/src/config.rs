//! Rate polling configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for rate polling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesConfig {
    /// Poll interval per target currency (seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Age after which a rate is shown as stale (seconds)
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_stale_after_secs() -> u64 {
    60
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl RatesConfig {
    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RatesConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.stale_after_secs, 60);
    }

    #[test]
    fn test_partial_json() {
        let config: RatesConfig = serde_json::from_str(r#"{ "poll_interval_secs": 3 }"#).unwrap();
        assert_eq!(config.poll_interval_secs, 3);
        assert_eq!(config.stale_after_secs, 60);
    }
}
