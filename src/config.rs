//! Configuration loading and management for newsbrief.
//!
//! Loads settings from `newsbrief.toml` with environment variable overrides
//! for the API keys.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key for: {0}")]
    MissingApiKey(String),
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Gemini model identifier (e.g., "gemini-2.0-flash")
    pub model: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
        }
    }
}

/// API keys (usually loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub gemini_key: Option<String>,
    #[serde(default)]
    pub news_key: Option<String>,
}

/// Headline-fetch defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Two-letter country code for top headlines
    pub country: String,
    /// How many articles to request per call
    pub page_size: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            country: "us".to_string(),
            page_size: 10,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub news: NewsConfig,
}

impl Config {
    /// Load configuration from the default location (newsbrief.toml in cwd
    /// or home), falling back to defaults when no file exists. API keys in
    /// the environment always win.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::read_file(&path)?,
            None => Config::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.api.gemini_key = Some(key);
        }
        if let Ok(key) = std::env::var("NEWS_API_KEY") {
            self.api.news_key = Some(key);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from("newsbrief.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config").join("newsbrief").join("newsbrief.toml");
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }

    /// The Gemini API key, required before any model call
    pub fn gemini_key(&self) -> Result<&str, ConfigError> {
        self.api
            .gemini_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey("gemini".to_string()))
    }

    /// The NewsAPI key, required before any headline fetch
    pub fn news_key(&self) -> Result<&str, ConfigError> {
        self.api
            .news_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey("newsapi".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_when_sections_are_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.agent.model, "gemini-2.0-flash");
        assert_eq!(config.news.country, "us");
        assert_eq!(config.news.page_size, 10);
        assert!(config.api.gemini_key.is_none());
    }

    #[test]
    fn loads_from_a_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[agent]
model = "gemini-2.5-pro"

[api]
gemini_key = "file-key"

[news]
country = "gb"
page_size = 5
"#
        )
        .unwrap();

        temp_env::with_vars_unset(["GEMINI_API_KEY", "NEWS_API_KEY"], || {
            let config = Config::load_from(file.path()).unwrap();
            assert_eq!(config.agent.model, "gemini-2.5-pro");
            assert_eq!(config.gemini_key().unwrap(), "file-key");
            assert_eq!(config.news.country, "gb");
            assert_eq!(config.news.page_size, 5);
        });
    }

    #[test]
    fn environment_overrides_file_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\ngemini_key = \"file-key\"").unwrap();

        temp_env::with_var("GEMINI_API_KEY", Some("env-key"), || {
            let config = Config::load_from(file.path()).unwrap();
            assert_eq!(config.gemini_key().unwrap(), "env-key");
        });
    }

    #[test]
    fn missing_keys_are_reported_by_name() {
        temp_env::with_vars_unset(["GEMINI_API_KEY", "NEWS_API_KEY"], || {
            let config = Config::default();
            assert!(matches!(
                config.gemini_key(),
                Err(ConfigError::MissingApiKey(ref which)) if which == "gemini"
            ));
            assert!(matches!(
                config.news_key(),
                Err(ConfigError::MissingApiKey(ref which)) if which == "newsapi"
            ));
        });
    }
}
