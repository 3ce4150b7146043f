//! Configuration loading and parsing.
//!
//! Parses `oxsh.toml` (or an override path passed via `--config`). Unknown
//! fields are ignored and a missing file or parse error yields
//! `ShellConfig::default()` with a `tracing::warn!`, so a broken config file
//! degrades the shell rather than refusing to start.

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "LogConfig::default_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LogConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "HistoryConfig::default_max_entries")]
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: Self::default_max_entries(),
        }
    }
}

impl HistoryConfig {
    const fn default_max_entries() -> usize {
        1000
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "StateConfig::default_backend")]
    pub backend: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: Self::default_backend(),
        }
    }
}

impl StateConfig {
    fn default_backend() -> String {
        "memory".to_string()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ShellConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub startup_mode: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            file: None,
        }
    }
}

/// Best-effort config path following platform conventions: a local file
/// first, then the XDG config dir as a fallback.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("oxsh.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("oxsh").join("oxsh.toml");
    }
    PathBuf::from("oxsh.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<ShellConfig> {
    let path = path.unwrap_or_else(discover);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "config file unreadable, using defaults");
            return Ok(ShellConfig::default());
        }
    };
    match toml::from_str::<ShellConfig>(&content) {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "config file failed to parse, using defaults");
            Ok(ShellConfig::default())
        }
    }
}
