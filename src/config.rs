//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` when present and deserializes into strongly-typed
//! structs; a missing file falls back to defaults so a bare cron install
//! needs nothing but an API key in the environment. Secrets never live
//! in the config file — they are read from the environment at runtime.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub arena: ArenaConfig,
    pub state: StateConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    /// Name used at registration and for the accuracy report.
    pub name: String,
    /// Round type submitted with each bet ("daily" or "weekly").
    pub round_type: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ArenaConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StateConfig {
    pub agent_file: String,
    pub history_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            arena: ArenaConfig::default(),
            state: StateConfig::default(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "augur".to_string(),
            round_type: "daily".to_string(),
        }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://arena.openclaw.ai/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            agent_file: crate::storage::DEFAULT_AGENT_FILE.to_string(),
            history_file: crate::storage::DEFAULT_HISTORY_FILE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, or fall back to defaults
    /// when the file does not exist. A present-but-malformed file is
    /// a hard error — silent fallback is reserved for state files.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Read an optional environment variable, treating empty as unset.
    pub fn env_opt(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}
