//! OpenAI-compatible chat-completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::completion::{Completion, CompletionError, ModelConfig};

/// Default endpoint for the hosted OpenAI API
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any endpoint speaking the `/chat/completions` protocol
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// Create a new client
    ///
    /// Fails with [`CompletionError::Configuration`] when no API key is given,
    /// so a run never starts against an endpoint that will reject it.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, CompletionError> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CompletionError::Configuration("OpenAI API key is missing".to_string()))?;

        let base_url = base_url.into();
        url::Url::parse(&base_url).map_err(|e| {
            CompletionError::Configuration(format!("invalid base URL '{}': {}", base_url, e))
        })?;

        let client = Client::builder()
            .user_agent(concat!("agent-swarm/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Build the request body for a single-turn completion
fn request_body(prompt: &str, model: &ModelConfig) -> serde_json::Value {
    let mut body = json!({
        "model": model.model,
        "messages": [
            {
                "role": "user",
                "content": prompt
            }
        ],
        "temperature": model.temperature,
    });

    if let Some(max_tokens) = model.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }

    body
}

/// Pull the first choice's text out of a response body
fn extract_content(body: &str) -> Result<String, CompletionError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::MalformedResponse("response has no message content".to_string()))
}

#[async_trait]
impl Completion for OpenAiClient {
    async fn complete(&self, prompt: &str, model: &ModelConfig) -> Result<String, CompletionError> {
        tracing::debug!(
            model = %model.model,
            prompt_chars = prompt.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request_body(prompt, model))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(CompletionError::Provider {
                status: status.as_u16(),
                body: text,
            });
        }

        extract_content(&text)
    }

    fn provider(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = OpenAiClient::new(DEFAULT_BASE_URL, Some("   ".to_string()))
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = OpenAiClient::new("not a url", Some("sk-test".to_string()))
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = OpenAiClient::new("https://openrouter.ai/api/v1/", Some("sk-test".to_string())).unwrap();
        assert_eq!(client.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
    }

    #[test]
    fn test_request_body() {
        let body = request_body("hello", &ModelConfig::new("gpt-4o").with_temperature(0.5));
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["messages"][0]["content"], "hello");
        assert!(body.get("max_tokens").is_none());

        let body = request_body("hello", &ModelConfig::new("gpt-4o").with_max_tokens(100));
        assert_eq!(body["max_tokens"], 100);
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"A. B. C."}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "A. B. C.");
    }

    #[test]
    fn test_extract_content_malformed() {
        assert!(matches!(
            extract_content(r#"{"choices":[]}"#),
            Err(CompletionError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_content("not json"),
            Err(CompletionError::MalformedResponse(_))
        ));
    }
}
