use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::playback::EngineSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub stream: StreamProxyConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
}

/// Catalog service endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Stream proxy endpoint serving `/stream/{channel}` and its cleanup route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamProxyConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Playback session tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Delay absorbing rapid channel-switch input before a tune executes.
    #[serde(default = "default_switch_debounce_ms")]
    pub switch_debounce_ms: u64,
    /// Forward buffer bound handed to the adaptive streaming engine.
    #[serde(default = "default_max_buffer_length_secs")]
    pub max_buffer_length_secs: u32,
    #[serde(default = "default_max_buffer_size_bytes")]
    pub max_buffer_size_bytes: u64,
    /// Bounded retry counts for manifest and level loading.
    #[serde(default = "default_load_max_retry")]
    pub manifest_load_max_retry: u32,
    #[serde(default = "default_load_max_retry")]
    pub level_load_max_retry: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Playlist URL used when the CLI is invoked without `--url`.
    pub playlist_url: Option<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_switch_debounce_ms() -> u64 {
    300
}

fn default_max_buffer_length_secs() -> u32 {
    30
}

fn default_max_buffer_size_bytes() -> u64 {
    60 * 1024 * 1024
}

fn default_load_max_retry() -> u32 {
    4
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for StreamProxyConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            switch_debounce_ms: default_switch_debounce_ms(),
            max_buffer_length_secs: default_max_buffer_length_secs(),
            max_buffer_size_bytes: default_max_buffer_size_bytes(),
            manifest_load_max_retry: default_load_max_retry(),
            level_load_max_retry: default_load_max_retry(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            playlist_url: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl PlaybackConfig {
    pub fn switch_debounce(&self) -> Duration {
        Duration::from_millis(self.switch_debounce_ms)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            max_buffer_length_secs: self.max_buffer_length_secs,
            max_buffer_size_bytes: self.max_buffer_size_bytes,
            manifest_load_max_retry: self.manifest_load_max_retry,
            level_load_max_retry: self.level_load_max_retry,
        }
    }
}

impl IngestionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Resolve the config file path: explicit path first, then the
/// `CONFIG_FILE` environment value, then `config.toml`.
fn resolve_config_file(path: Option<&str>, env_override: Option<String>) -> String {
    path.map(str::to_string)
        .or(env_override)
        .unwrap_or_else(|| "config.toml".to_string())
}

impl Config {
    /// Load configuration from `path` when given, falling back to the
    /// `CONFIG_FILE` environment variable and then `config.toml`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_file = resolve_config_file(path, std::env::var("CONFIG_FILE").ok());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            info!("Configuration loaded from: {}", config_file);
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}
