//! OpenAI-compatible client implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, Fireworks AI,
//! and any endpoint exposing an OpenAI-compatible `/v1/chat/completions`.
//!
//! The pipeline sends one prompt per call and expects one completion back;
//! the single user message carries the whole instruction text.

use async_trait::async_trait;
use draftsmith_core::client::{Completion, CompletionRequest, LlmClient, StructuredMessage};
use draftsmith_core::error::ProviderError;
use serde::Deserialize;
use tracing::{debug, warn};

/// An OpenAI-compatible LLM client.
///
/// This handles the vast majority of providers since most expose an
/// OpenAI-compatible chat completions endpoint.
pub struct OpenAiCompatClient {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a new OpenAI-compatible client.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create an OpenRouter client (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Create an OpenAI client (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Ollama client (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Result<Self, ProviderError> {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    fn parse_completion(api_response: ApiResponse) -> Result<Completion, ProviderError> {
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let mut metadata = serde_json::Map::new();
        if let Some(reason) = choice.finish_reason {
            metadata.insert("finish_reason".into(), serde_json::Value::String(reason));
        }

        Ok(Completion::Structured(StructuredMessage {
            content: choice.message.content,
            model: api_response.model,
            metadata,
        }))
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<Completion, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(client = %self.name, model = %request.model, prompt_len = request.prompt.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        Self::parse_completion(api_response)
    }
}

// --- API wire types ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = OpenAiCompatClient::new("test", "https://api.example.com/v1/", "key").unwrap();
        assert_eq!(client.base_url, "https://api.example.com/v1");
        assert_eq!(client.name(), "test");
    }

    #[test]
    fn response_parses_into_structured_completion() {
        let api_response: ApiResponse = serde_json::from_str(
            r##"{
                "model": "gpt-4o",
                "choices": [{
                    "message": { "role": "assistant", "content": "# Formatted draft" },
                    "finish_reason": "stop"
                }]
            }"##,
        )
        .unwrap();

        let completion = OpenAiCompatClient::parse_completion(api_response).unwrap();
        assert_eq!(completion.into_text(), "# Formatted draft");
    }

    #[test]
    fn empty_choices_is_an_api_error() {
        let api_response: ApiResponse =
            serde_json::from_str(r#"{"choices": []}"#).unwrap();
        let err = OpenAiCompatClient::parse_completion(api_response).unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { .. }));
    }

    #[test]
    fn missing_content_still_normalizes() {
        let api_response: ApiResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant"}, "finish_reason": "length"}]}"#,
        )
        .unwrap();
        let completion = OpenAiCompatClient::parse_completion(api_response).unwrap();
        // Falls back to a string rendering of the structured payload.
        let text = completion.into_text();
        assert!(text.contains("finish_reason"));
    }
}
