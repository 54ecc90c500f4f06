//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/clipscope/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/clipscope/` (~/.config/clipscope/)
//! - Data: `$XDG_DATA_HOME/clipscope/` (~/.local/share/clipscope/)
//! - State/Logs: `$XDG_STATE_HOME/clipscope/` (~/.local/state/clipscope/)
//!
//! Two environment variables override the file:
//! - `CLIPSCOPE_COVER_BASE_URL` replaces `normalize.cover_base_url`
//! - `CLIPSCOPE_CHAT_API_KEY` fills `chat.api_key`

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the cover base URL.
pub const COVER_BASE_URL_ENV: &str = "CLIPSCOPE_COVER_BASE_URL";

/// Environment variable supplying the chat API key.
pub const CHAT_API_KEY_ENV: &str = "CLIPSCOPE_CHAT_API_KEY";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Record normalization settings
    #[serde(default)]
    pub normalize: NormalizeConfig,

    /// Analytics view settings
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Chat completion settings (optional)
    #[serde(default)]
    pub chat: Option<ChatConfig>,

    /// Document source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Normalization configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NormalizeConfig {
    /// Prefix for cover fields that hold a bare filename
    #[serde(default = "default_cover_base_url")]
    pub cover_base_url: String,

    /// Title used when an entry has none
    #[serde(default = "default_placeholder_title")]
    pub placeholder_title: String,

    /// Uploader used when an entry has none
    #[serde(default = "default_placeholder_uploader")]
    pub placeholder_uploader: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            cover_base_url: default_cover_base_url(),
            placeholder_title: default_placeholder_title(),
            placeholder_uploader: default_placeholder_uploader(),
        }
    }
}

fn default_cover_base_url() -> String {
    "https://i0.hdslb.com/bfs/archive/".to_string()
}

fn default_placeholder_title() -> String {
    "未命名稿件".to_string()
}

fn default_placeholder_uploader() -> String {
    "未知投稿者".to_string()
}

/// Analytics configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Length of the play-count and recency rankings
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Maximum entries in the keyword table
    #[serde(default = "default_keyword_limit")]
    pub keyword_limit: usize,

    /// Minimum frequency for a keyword to be kept
    #[serde(default = "default_keyword_min_count")]
    pub keyword_min_count: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            keyword_limit: default_keyword_limit(),
            keyword_min_count: default_keyword_min_count(),
        }
    }
}

fn default_top_n() -> usize {
    20
}

fn default_keyword_limit() -> usize {
    100
}

fn default_keyword_min_count() -> usize {
    2
}

/// Chat completion configuration
///
/// The endpoint must speak the OpenAI-compatible `/chat/completions` protocol.
#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// API base URL (e.g., `https://api.openai.com/v1`)
    #[serde(default = "default_chat_endpoint")]
    pub endpoint: String,

    /// Model to use
    pub model: String,

    /// API key (can also use `CLIPSCOPE_CHAT_API_KEY`)
    pub api_key: Option<String>,

    /// Maximum records serialized into the system prompt
    #[serde(default = "default_chat_max_records")]
    pub max_records: usize,

    /// Connect timeout and idle time allowed between streamed chunks, in
    /// seconds. A streamed answer can take longer overall.
    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,
}

impl ChatConfig {
    /// Create a config for a model with every other field defaulted.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            endpoint: default_chat_endpoint(),
            model: model.into(),
            api_key: None,
            max_records: default_chat_max_records(),
            timeout_secs: default_chat_timeout(),
        }
    }

    /// Fill `api_key` from `CLIPSCOPE_CHAT_API_KEY` when the config has none.
    pub fn apply_env_key(&mut self) {
        self.fill_api_key(std::env::var(CHAT_API_KEY_ENV).ok());
    }

    fn fill_api_key(&mut self, from_env: Option<String>) {
        if self.api_key.is_none() {
            self.api_key = from_env
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty());
        }
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::Config("chat.model must not be empty".to_string()));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(Error::Config(format!(
                "chat.endpoint must be an http(s) URL, got {:?}",
                self.endpoint
            )));
        }
        if self.max_records == 0 {
            return Err(Error::Config(
                "chat.max_records must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_chat_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

pub(crate) fn default_chat_max_records() -> usize {
    50
}

fn default_chat_timeout() -> u64 {
    120
}

/// Document source configuration
#[derive(Debug, Deserialize, Default)]
pub struct SourceConfig {
    /// Override for the directory holding `<project_id>.json` documents
    pub documents_dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            let mut config = Config::default();
            config.apply_env_overrides();
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply `CLIPSCOPE_*` environment overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var(COVER_BASE_URL_ENV) {
            if !base.trim().is_empty() {
                self.normalize.cover_base_url = base.trim().to_string();
            }
        }

        if let Some(chat) = self.chat.as_mut() {
            chat.apply_env_key();
        }
    }

    /// Directory holding project documents, honoring `source.documents_dir`.
    pub fn documents_dir(&self) -> PathBuf {
        self.source
            .documents_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("projects"))
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/clipscope/config.toml` (~/.config/clipscope/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("clipscope").join("config.toml")
    }

    /// Returns the data directory path (for project documents)
    ///
    /// `$XDG_DATA_HOME/clipscope/` (~/.local/share/clipscope/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("clipscope")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/clipscope/` (~/.local/state/clipscope/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("clipscope")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/clipscope/clipscope.log` (~/.local/state/clipscope/clipscope.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("clipscope.log")
    }
}
