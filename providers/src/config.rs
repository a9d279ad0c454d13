//! Configuration loading (`.swarm.toml`)

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::completion::ModelConfig;

/// File name searched for by [`SwarmFileConfig::load`]
pub const CONFIG_FILE_NAME: &str = ".swarm.toml";

/// Find a config file by walking up the directory tree, then checking global config.
///
/// Search order:
/// 1. Current directory and parent directories (walking up to root)
/// 2. Global config at ~/.config/swarm/
fn find_config_file(filename: &str) -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let candidate = current.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("swarm").join(filename);
        if global_path.exists() {
            return Some(global_path);
        }
    }

    None
}

/// Top-level configuration (from .swarm.toml)
#[derive(Debug, Default, Deserialize)]
pub struct SwarmFileConfig {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub search: SearchSection,
}

/// Which completion client to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Ollama,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(format!("unknown provider '{}' (expected openai or ollama)", other)),
        }
    }
}

/// LLM configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default)]
    pub provider: ProviderKind,
    /// Endpoint override; each provider has its own default
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-call completion budget in seconds (0 = unbounded)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Web search configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub enabled: bool,
    /// SearXNG instance URL
    #[serde(default = "default_searxng_url")]
    pub url: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Engines to use (comma-separated, empty = use instance defaults)
    #[serde(default)]
    pub engines: String,
}

// Default value functions
fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_searxng_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_max_results() -> usize {
    5
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_searxng_url(),
            max_results: default_max_results(),
            engines: String::new(),
        }
    }
}

impl LlmSection {
    /// The model settings agents inherit when a definition does not override them
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Per-call timeout, if one is configured
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.timeout_secs))
    }
}

impl SwarmFileConfig {
    /// Load config from .swarm.toml
    ///
    /// Search order:
    /// 1. Walk up directory tree from cwd looking for .swarm.toml
    /// 2. Check ~/.config/swarm/.swarm.toml (global fallback)
    /// 3. Fall back to defaults
    pub fn load() -> Result<Self> {
        if let Some(config_path) = find_config_file(CONFIG_FILE_NAME) {
            tracing::debug!("Loading config from: {}", config_path.display());
            return Self::load_from_path(&config_path);
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: SwarmFileConfig = toml::from_str(content)?;
        Ok(config)
    }
}
