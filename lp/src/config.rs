//! LifePilot configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOCAL_CONFIG: &str = ".lifepilot.yml";

/// Settings read from `lifepilot.yml`; every section may be omitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub assistant: AssistantConfig,

    /// trace, debug, info, warn or error; `--log-level` wins over this
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Checks that only matter once the assistant service is involved
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            eyre::bail!(
                "No API key for the assistant: export {} or use the direct task/habit/project commands",
                self.llm.api_key_env
            );
        }
        if self.assistant.history_limit == 0 {
            eyre::bail!("assistant.history-limit must be at least 1");
        }
        Ok(())
    }

    /// Read the first config found: `--config`, then `./.lifepilot.yml`,
    /// then the user config dir
    ///
    /// An explicit path must parse. A broken implicit file is skipped with a
    /// warning, and finding nothing yields the defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::read(path).with_context(|| format!("Failed to load config from {}", path.display()));
        }

        for path in Self::search_path(None) {
            if !path.exists() {
                continue;
            }
            match Self::read(&path) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable config"),
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Just the log level, read before logging is set up
    ///
    /// Never fails; a broken config is reported later by `load`.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::search_path(config_path)
            .into_iter()
            .find(|p| p.exists())
            .and_then(|p| Self::read(&p).ok())
            .and_then(|config| config.log_level)
    }

    fn search_path(explicit: Option<&PathBuf>) -> Vec<PathBuf> {
        match explicit {
            Some(path) => vec![path.clone()],
            None => std::iter::once(PathBuf::from(LOCAL_CONFIG))
                .chain(dirs::config_dir().map(|d| d.join("lifepilot").join("lifepilot.yml")))
                .collect(),
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

/// The model service that turns utterances into tool calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LlmConfig {
    /// Only `anthropic` is wired up
    pub provider: String,
    pub model: String,
    /// Name of the variable holding the key, never the key itself
    pub api_key_env: String,
    pub base_url: String,
    /// Hard cap on any request, whatever the assistant asks for
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// JSON file holding projects, tasks, habits and facts
    pub state_file: String,
    /// How long a save may take before the change is rolled back
    pub save_timeout_ms: u64,
}

impl StorageConfig {
    pub fn state_path(&self) -> PathBuf {
        PathBuf::from(&self.state_file)
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let state_file = match dirs::data_local_dir() {
            Some(dir) => dir.join("lifepilot").join("state.json").display().to_string(),
            None => ".lifepilot/state.json".to_string(),
        };

        Self {
            state_file,
            save_timeout_ms: 5_000,
        }
    }
}

/// What to do when a name matches several entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Refuse the call and list the candidates
    #[default]
    Reject,
    /// Take the most recently created match
    PreferRecent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AssistantConfig {
    pub ambiguity: AmbiguityPolicy,
    /// Messages of history a chat session replays to the model
    pub history_limit: usize,
    /// Tokens requested per turn
    pub max_tokens: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            ambiguity: AmbiguityPolicy::Reject,
            history_limit: 20,
            max_tokens: 1024,
        }
    }
}
