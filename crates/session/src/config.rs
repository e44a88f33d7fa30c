//! Session resolver configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the session resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a resolved session is reused without probing again (seconds)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Probe all three session endpoints when the token carries no
    /// recognised role claim, instead of only the standard-user endpoint
    #[serde(default)]
    pub probe_all_when_unclaimed: bool,
}

fn default_cache_ttl_secs() -> u64 {
    300 // 5 minutes
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            probe_all_when_unclaimed: false,
        }
    }
}

impl SessionConfig {
    /// Get cache TTL as Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
