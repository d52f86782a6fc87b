//! Configuration management for Redditor
//!
//! Settings live in a TOML file; every section and field is optional and
//! falls back to its default. Account credentials are not part of the file,
//! see [`crate::credentials`]; they come from the environment, which a
//! project `.env` file can populate via [`load_env_file`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::enrichment::cohere::{
    DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
use crate::error::{ConfigError, Result};
use crate::retry::{RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_MAX_ATTEMPTS};

pub const ENV_CONFIG_PATH: &str = "REDDITOR_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reddit: RedditConfig,
    pub retry: RetryConfig,
    pub enrichment: EnrichmentConfig,
    pub server: ServerConfig,
    pub logging: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    /// Base URL for authenticated API calls
    pub api_base: String,
    /// Base URL for the token exchange
    pub auth_base: String,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            api_base: "https://oauth.reddit.com".to_string(),
            auth_base: "https://www.reddit.com".to_string(),
            timeout: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Human-readable duration, e.g. "2s" or "500ms"
    pub base_delay: String,
    pub backoff_multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: "2s".to_string(),
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Result<Duration> {
        humantime::parse_duration(&self.base_delay).map_err(|e| {
            ConfigError::Invalid(format!("retry.base_delay '{}': {}", self.base_delay, e)).into()
        })
    }

    pub fn policy(&self) -> Result<RetryPolicy> {
        Ok(RetryPolicy::new(
            self.max_attempts,
            self.base_delay()?,
            self.backoff_multiplier,
        )?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Enrichment also requires `COHERE_API_KEY` to be set
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8045,
            static_dir: "static".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Write a daily-rotated log file in addition to the console
    pub to_file: bool,
    pub directory: String,
    pub file_prefix: String,
    pub level: String,
    /// One of "text", "json" or "pretty"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            to_file: true,
            directory: "logs".to_string(),
            file_prefix: "redditor.log".to_string(),
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file at the default location yields the default
    /// configuration; a missing file named by `REDDITOR_CONFIG` is an error.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var(ENV_CONFIG_PATH).is_ok();
        let config_path = resolve_config_path()?;

        if !explicit && !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.retry.policy()?;

        if !(0.0..=2.0).contains(&self.enrichment.temperature) {
            return Err(ConfigError::Invalid(format!(
                "enrichment.temperature must be between 0.0 and 2.0, got {}",
                self.enrichment.temperature
            ))
            .into());
        }

        if self.enrichment.max_tokens == 0 {
            return Err(
                ConfigError::Invalid("enrichment.max_tokens must be at least 1".to_string()).into(),
            );
        }

        if self.reddit.timeout == 0 {
            return Err(
                ConfigError::Invalid("reddit.timeout must be at least 1 second".to_string()).into(),
            );
        }

        Ok(())
    }
}

/// Load `KEY=value` pairs from a `.env` file into the process environment
///
/// The file is looked up in the working directory and its parents. Values
/// from the file replace variables that are already set. Returns the path
/// that was loaded, or `None` when there is no file.
pub fn load_env_file() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv_override() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(ConfigError::Invalid(format!("failed to load .env file: {}", e)).into()),
    }
}

/// Load a specific env file; returns `false` if it does not exist
pub fn load_env_file_from(path: &Path) -> Result<bool> {
    match dotenvy::from_path_override(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(ConfigError::Invalid(format!(
            "failed to load {}: {}",
            path.display(),
            e
        ))
        .into()),
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("redditor").join("config.toml"))
}
