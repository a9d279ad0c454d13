//! Text-completion abstraction layer

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Model selection and sampling settings for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier (e.g., "gpt-4o", "qwen3:14b")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 2.0 = most creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.5
}

/// Upper bound accepted by the providers we talk to
pub const MAX_TEMPERATURE: f32 = 2.0;

impl ModelConfig {
    /// Create a model configuration with the default temperature
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Check that the configuration can be sent to a provider
    pub fn validate(&self) -> Result<(), CompletionError> {
        if self.model.trim().is_empty() {
            return Err(CompletionError::Configuration(
                "model identifier is empty".to_string(),
            ));
        }
        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(CompletionError::Configuration(format!(
                "temperature {} is outside 0.0..={}",
                self.temperature, MAX_TEMPERATURE
            )));
        }
        Ok(())
    }
}

/// Errors raised by completion providers
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Ollama error: {0}")]
    Ollama(String),
}

impl CompletionError {
    /// Whether this error was detected before any request was sent
    pub fn is_configuration(&self) -> bool {
        matches!(self, CompletionError::Configuration(_))
    }
}

/// Opaque text-generation capability
///
/// Implementations must be safe to call concurrently from independent runs.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Turn a prompt into text using the given model settings
    async fn complete(&self, prompt: &str, model: &ModelConfig) -> Result<String, CompletionError>;

    /// Short provider name for logging
    fn provider(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_builder() {
        let config = ModelConfig::new("gpt-4o")
            .with_temperature(0.2)
            .with_max_tokens(512);

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, Some(512));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let err = ModelConfig::new("  ").validate().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_validate_rejects_temperature_out_of_range() {
        assert!(ModelConfig::new("m").with_temperature(-0.1).validate().is_err());
        assert!(ModelConfig::new("m").with_temperature(2.5).validate().is_err());
        assert!(ModelConfig::new("m").with_temperature(2.0).validate().is_ok());
    }

    #[test]
    fn test_deserialize_defaults_temperature() {
        let config: ModelConfig = toml::from_str(r#"model = "llama3.1:8b""#).unwrap();
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.max_tokens, None);
    }
}
