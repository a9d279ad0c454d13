//! Ollama completion client

use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    models::ModelOptions,
    Ollama,
};

use crate::completion::{Completion, CompletionError, ModelConfig};

/// Default local Ollama endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama client wrapper
pub struct OllamaClient {
    client: Ollama,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(url: &str) -> Result<Self, CompletionError> {
        // Ollama wants host and port separately
        let url = url::Url::parse(url).map_err(|e| {
            CompletionError::Configuration(format!("invalid Ollama URL '{}': {}", url, e))
        })?;

        let host = url.host_str().ok_or_else(|| {
            CompletionError::Configuration(format!("Ollama URL '{}' has no host", url))
        })?;
        let port = url.port().unwrap_or(11434);

        let client = Ollama::builder()
            .host(format!("{}://{}", url.scheme(), host))
            .port(port)
            .build();

        Ok(Self { client })
    }
}

fn model_options(model: &ModelConfig) -> ModelOptions {
    let options = ModelOptions::default().temperature(model.temperature);
    match model.max_tokens {
        Some(max_tokens) => options.num_predict(max_tokens as i32),
        None => options,
    }
}

#[async_trait]
impl Completion for OllamaClient {
    async fn complete(&self, prompt: &str, model: &ModelConfig) -> Result<String, CompletionError> {
        tracing::debug!(
            model = %model.model,
            prompt_chars = prompt.len(),
            "Sending Ollama chat request"
        );

        let request = ChatMessageRequest::new(
            model.model.clone(),
            vec![ChatMessage::user(prompt.to_string())],
        )
        .options(model_options(model));

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| CompletionError::Ollama(e.to_string()))?;

        Ok(response.message.content)
    }

    fn provider(&self) -> &str {
        "ollama"
    }
}
