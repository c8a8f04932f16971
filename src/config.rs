use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::types::MarketId;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub system: SystemConfig,
    pub scraper: ScraperConfig,
    pub selectors: Selectors,
    pub markets: MarketsConfig,
    pub tracking: TrackingConfig,
    pub history: HistoryConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub data_dir: PathBuf,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub navigation_timeout_secs: u64,
    /// Upper bound on waiting for outcome rows to render
    pub settle_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 30,
            settle_timeout_secs: 8,
            poll_interval_ms: 250,
            headless: true,
            chrome_executable: None,
        }
    }
}

/// CSS selectors locating each field on a market page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub row: String,
    pub total_volume: String,
    pub name: String,
    pub probability: String,
    pub yes_price: String,
    pub no_price: String,
    pub change: String,
    pub volume: String,
    pub tag: String,
}

fn by_test_id(id: &str) -> String {
    format!(r#"[data-testid="{}"]"#, id)
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            row: by_test_id("market-outcome"),
            total_volume: by_test_id("market-volume"),
            name: by_test_id("outcome-name"),
            probability: by_test_id("outcome-probability"),
            yes_price: by_test_id("yes-price"),
            no_price: by_test_id("no-price"),
            change: by_test_id("price-change"),
            volume: by_test_id("outcome-volume"),
            tag: by_test_id("outcome-tag"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarketsConfig {
    pub london: Option<String>,
    pub nyc: Option<String>,
}

impl MarketsConfig {
    /// Event URL per market, falling back to the built-in pages
    pub fn urls(&self) -> HashMap<MarketId, String> {
        MarketId::ALL
            .iter()
            .map(|&market| {
                let configured = match market {
                    MarketId::London => self.london.as_ref(),
                    MarketId::Nyc => self.nyc.as_ref(),
                };
                let url = configured
                    .cloned()
                    .unwrap_or_else(|| market.default_url().to_string());
                (market, url)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 500 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub json_logs: bool,
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub bot_token: String,
    pub chat_id: i64,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load `path`, or `None` when it does not exist.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup("BOT_TOKEN").context("BOT_TOKEN not set")?;
        let chat_id: i64 = lookup("CHAT_ID")
            .context("CHAT_ID not set")?
            .trim()
            .parse()
            .context("CHAT_ID must be a numeric chat id")?;

        Ok(Self {
            bot_token,
            chat_id,
            config_path: lookup("CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("config.toml")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.system.data_dir, PathBuf::from("data"));
        assert_eq!(config.scraper.navigation_timeout_secs, 30);
        assert!(config.scraper.headless);
        assert!(config.tracking.enabled);
        assert_eq!(config.selectors.row, r#"[data-testid="market-outcome"]"#);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [scraper]
            settle_timeout_secs = 3

            [markets]
            nyc = "https://example.com/nyc"

            [tracking]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.scraper.settle_timeout_secs, 3);
        assert_eq!(config.scraper.poll_interval_ms, 250);
        assert!(!config.tracking.enabled);
        assert_eq!(config.tracking.interval_secs, 3600);

        let urls = config.markets.urls();
        assert_eq!(urls[&MarketId::Nyc], "https://example.com/nyc");
        assert_eq!(urls[&MarketId::London], MarketId::London.default_url());
    }

    #[test]
    fn test_missing_config_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_optional(&dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_none());
        assert_eq!(loaded.unwrap_or_default().history.max_entries, 500);
    }

    #[test]
    fn test_existing_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[history]\nmax_entries = 7\n").unwrap();

        let loaded = Config::load_optional(&path).unwrap().unwrap();
        assert_eq!(loaded.history.max_entries, 7);
    }

    #[test]
    fn test_env_config() {
        let config =
            EnvConfig::from_lookup(env(&[("BOT_TOKEN", "t"), ("CHAT_ID", " -100 ")])).unwrap();
        assert_eq!(config.bot_token, "t");
        assert_eq!(config.chat_id, -100);
        assert_eq!(config.config_path, PathBuf::from("config.toml"));
    }

    #[test]
    fn test_env_config_requires_secrets() {
        assert!(EnvConfig::from_lookup(env(&[("CHAT_ID", "1")])).is_err());
        assert!(EnvConfig::from_lookup(env(&[("BOT_TOKEN", "t")])).is_err());
        assert!(EnvConfig::from_lookup(env(&[("BOT_TOKEN", "t"), ("CHAT_ID", "abc")])).is_err());
    }
}
