//! Donation flow and draft configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the donation flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Synthetic crypto confirmation delay before settling (milliseconds)
    #[serde(default = "default_settlement_delay_ms")]
    pub settlement_delay_ms: u64,
}

fn default_settlement_delay_ms() -> u64 {
    2_000
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            settlement_delay_ms: default_settlement_delay_ms(),
        }
    }
}

impl FlowConfig {
    pub fn settlement_delay(&self) -> Duration {
        Duration::from_millis(self.settlement_delay_ms)
    }
}

/// Configuration for form draft persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftConfig {
    /// Quiet period before an edited draft is written (milliseconds)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Drafts older than this are discarded on load (days)
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,
}

fn default_debounce_ms() -> u64 {
    800
}

fn default_max_age_days() -> i64 {
    7
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_age_days: default_max_age_days(),
        }
    }
}

impl DraftConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::days(self.max_age_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(FlowConfig::default().settlement_delay(), Duration::from_secs(2));
        let draft = DraftConfig::default();
        assert_eq!(draft.debounce(), Duration::from_millis(800));
        assert_eq!(draft.max_age(), chrono::Duration::days(7));
    }

    #[test]
    fn test_partial_json() {
        let config: DraftConfig = serde_json::from_str(r#"{ "debounce_ms": 50 }"#).unwrap();
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.max_age_days, 7);
    }
}
