//! Providers for the agent swarm
//!
//! This crate provides:
//! - The text-completion capability ([`Completion`]) and per-agent [`ModelConfig`]
//! - OpenAI-compatible and Ollama completion clients
//! - Web search backends used to augment task descriptions
//! - `.swarm.toml` configuration loading

pub mod completion;
pub mod config;
pub mod ollama;
pub mod openai;
pub mod search;

pub use completion::{Completion, CompletionError, ModelConfig};
pub use config::{LlmSection, ProviderKind, SearchSection, SwarmFileConfig};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use search::{SearchBackend, SearchResult, SearchResults, SearXNGBackend};

use std::sync::Arc;

/// Build the completion client selected by the `[llm]` section
///
/// The API key is passed explicitly; nothing is read from or written to the
/// process environment here.
pub fn completion_from_config(
    llm: &LlmSection,
    api_key: Option<String>,
) -> Result<Arc<dyn Completion>, CompletionError> {
    match llm.provider {
        ProviderKind::OpenAi => {
            let base_url = llm
                .url
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string());
            let client = OpenAiClient::new(base_url, api_key)?;
            Ok(Arc::new(client))
        }
        ProviderKind::Ollama => {
            let url = llm
                .url
                .clone()
                .unwrap_or_else(|| ollama::DEFAULT_OLLAMA_URL.to_string());
            Ok(Arc::new(OllamaClient::new(&url)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_requires_api_key() {
        let llm = LlmSection::default();
        let err = completion_from_config(&llm, None).err().expect("missing key must fail");
        assert!(matches!(err, CompletionError::Configuration(_)));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let llm = LlmSection {
            provider: ProviderKind::Ollama,
            url: Some("http://localhost:11434".to_string()),
            ..Default::default()
        };
        let client = completion_from_config(&llm, None).unwrap();
        assert_eq!(client.provider(), "ollama");
    }
}
