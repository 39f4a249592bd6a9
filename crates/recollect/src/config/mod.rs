use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{RecollectError, Result};

/// Main configuration structure for Recollect
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Reasoning oracle configuration
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Knowledge store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Conversation context window configuration
    #[serde(default)]
    pub context: ContextConfig,
}

impl Config {
    /// Load configuration from an explicit path, or probe the default
    /// locations (`~/.recollect/config.toml`, the platform config dir,
    /// then `./config.toml`). Falls back to defaults when nothing exists.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(&path);
        }

        let default_paths = [
            dirs::home_dir().map(|h| h.join(".recollect").join("config.toml")),
            dirs::config_dir().map(|c| c.join("recollect").join("config.toml")),
            Some(PathBuf::from("config.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RecollectError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content)
            .map_err(|e| RecollectError::Config(format!("Failed to parse config: {e}")))
    }
}

/// Reasoning oracle configuration
///
/// The oracle is any OpenAI-compatible chat-completions endpoint. The API
/// key is never stored in the config file, only the name of the
/// environment variable that holds it.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// API endpoint URL
    #[serde(default)]
    pub api_url: String,
    /// Environment variable name for the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model identifier
    #[serde(default = "default_oracle_model")]
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_oracle_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key_env: default_api_key_env(),
            model: default_oracle_model(),
            timeout_secs: default_oracle_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "ORACLE_API_KEY".to_string()
}

fn default_oracle_model() -> String {
    "gemma2-9b-it".to_string()
}

fn default_oracle_timeout_secs() -> u64 {
    30
}

/// Knowledge store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the persisted snapshot
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".recollect").join("knowledge.json"))
        .unwrap_or_else(|| PathBuf::from("knowledge.json"))
}

/// Conversation context window configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ContextConfig {
    /// Byte budget for the window of compressed turn summaries
    #[serde(default = "default_byte_budget")]
    pub byte_budget: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            byte_budget: default_byte_budget(),
        }
    }
}

fn default_byte_budget() -> usize {
    5000
}
