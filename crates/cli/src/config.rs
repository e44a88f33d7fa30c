//! Application configuration

use freetag_donation::{DraftConfig, FlowConfig};
use freetag_rates::RatesConfig;
use freetag_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `api_base_url`
pub const API_URL_ENV: &str = "FREETAG_API_URL";

/// Top-level configuration, one section per component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Platform backend base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Directory holding the local key-value store
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub rates: RatesConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub flow: FlowConfig,

    #[serde(default)]
    pub draft: DraftConfig,
}

fn default_api_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            data_dir: default_data_dir(),
            rates: RatesConfig::default(),
            session: SessionConfig::default(),
            flow: FlowConfig::default(),
            draft: DraftConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Load from `path` if given, then apply the environment override
    pub fn load(path: Option<&Path>) -> std::io::Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_api_url_override(std::env::var(API_URL_ENV).ok()))
    }

    /// Replace `api_base_url` with a non-blank override
    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            self.api_base_url = url;
        }
        self
    }

    /// Path of the key-value store file
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:4000");
        assert_eq!(config.store_path(), PathBuf::from("./data/store.json"));
        assert_eq!(config.flow.settlement_delay(), Duration::from_millis(2000));
        assert_eq!(config.draft.max_age_days, 7);
    }

    #[test]
    fn test_from_file_fills_missing_sections() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "api_base_url": "https://api.freetag.org",
                "rates": {{ "poll_interval_secs": 30 }},
                "session": {{ "probe_all_when_unclaimed": true }}
            }}"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_base_url, "https://api.freetag.org");
        assert_eq!(config.rates.poll_interval_secs, 30);
        assert_eq!(config.rates.stale_after_secs, 60);
        assert!(config.session.probe_all_when_unclaimed);
        assert_eq!(config.draft.debounce_ms, 800);
    }

    #[test]
    fn test_from_file_rejects_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "api_base_url = 'toml'").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_api_url_override() {
        let config = AppConfig::default()
            .with_api_url_override(Some(" https://staging.freetag.org ".into()));
        assert_eq!(config.api_base_url, "https://staging.freetag.org");

        let config = AppConfig::default().with_api_url_override(Some("   ".into()));
        assert_eq!(config.api_base_url, "http://localhost:4000");

        let config = AppConfig::default().with_api_url_override(None);
        assert_eq!(config.api_base_url, "http://localhost:4000");
    }
}
