//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Polling and HTTP behavior settings
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Page markup selectors
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Telegram bot credentials and destination
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Durable store settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// The `TELEGRAM_BOT_TOKEN` environment variable, when set, overrides
    /// the token from the file so credentials can stay out of it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            config.telegram.bot_token = token;
        }
        Ok(config)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.watcher.source_url.trim().is_empty() {
            return Err(AppError::validation("watcher.source_url is empty"));
        }
        if url::Url::parse(&self.watcher.source_url).is_err() {
            return Err(AppError::validation("watcher.source_url is not a valid URL"));
        }
        if self.watcher.poll_interval_secs == 0 {
            return Err(AppError::validation(
                "watcher.poll_interval_secs must be > 0",
            ));
        }
        if self.watcher.timeout_secs == 0 {
            return Err(AppError::validation("watcher.timeout_secs must be > 0"));
        }
        if self.watcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("watcher.user_agent is empty"));
        }
        if self.selectors.item_selector.trim().is_empty() {
            return Err(AppError::validation("selectors.item_selector is empty"));
        }
        if self.telegram.bot_token.trim().is_empty() {
            return Err(AppError::validation("telegram.bot_token is empty"));
        }
        if self.telegram.chat_id == 0 {
            return Err(AppError::validation("telegram.chat_id is not set"));
        }
        if self.storage.db_path.trim().is_empty() {
            return Err(AppError::validation("storage.db_path is empty"));
        }
        Ok(())
    }
}

/// Polling and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// URL of the watched listing page
    #[serde(default = "defaults::source_url")]
    pub source_url: String,

    /// Delay between cycles in seconds
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            source_url: defaults::source_url(),
            poll_interval_secs: defaults::poll_interval(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// CSS selectors describing the watched page's item markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Selector matching one listed item
    #[serde(default = "defaults::item_selector")]
    pub item_selector: String,

    /// Selector for the title node nested inside an item
    #[serde(default = "defaults::title_selector")]
    pub title_selector: String,

    /// HTML attribute carrying the item link
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            item_selector: defaults::item_selector(),
            title_selector: defaults::title_selector(),
            link_attr: defaults::link_attr(),
        }
    }
}

/// Telegram bot settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    /// Bot API token (overridable via `TELEGRAM_BOT_TOKEN`)
    #[serde(default)]
    pub bot_token: String,

    /// Chat that receives announcements
    #[serde(default)]
    pub chat_id: i64,
}

/// Durable store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(default = "defaults::db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::db_path(),
        }
    }
}

mod defaults {
    // Watcher defaults
    pub fn source_url() -> String {
        "https://it.nso.ru/measures/finance/".into()
    }
    pub fn poll_interval() -> u64 {
        3600
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; fundwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Selector defaults for the watched page's markup
    pub fn item_selector() -> String {
        "a.main-page__content-information-link".into()
    }
    pub fn title_selector() -> String {
        "h4".into()
    }
    pub fn link_attr() -> String {
        "href".into()
    }

    // Storage defaults
    pub fn db_path() -> String {
        "data/measures.db".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        let mut config = Config::default();
        config.telegram.bot_token = "123456:test-token".to_string();
        config.telegram.chat_id = -100123456;
        config
    }

    #[test]
    fn validate_sample_config_ok() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_token() {
        // Defaults carry no credentials
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = sample_config();
        config.watcher.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = sample_config();
        config.watcher.source_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = sample_config();
        config.watcher.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_selectors_match_watched_page() {
        let config = Config::default();
        assert_eq!(
            config.selectors.item_selector,
            "a.main-page__content-information-link"
        );
        assert_eq!(config.selectors.title_selector, "h4");
        assert_eq!(config.selectors.link_attr, "href");
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let toml_str = r#"
            [telegram]
            bot_token = "t"
            chat_id = 42
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.watcher.poll_interval_secs, 3600);
        assert_eq!(config.telegram.chat_id, 42);
        assert!(config.validate().is_ok());
    }
}
