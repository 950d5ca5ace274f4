//! LlmClient trait — the abstraction over LLM backends.
//!
//! A client knows how to send a single prompt to an LLM and get a completion
//! back. The pipeline calls `complete()` without knowing which provider is
//! behind it; providers may hand back bare text or a structured message, and
//! [`Completion::into_text`] is the one place that difference is resolved.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Parameters for one completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "anthropic/claude-sonnet-4", "gpt-4o")
    pub model: String,

    /// The full prompt text, inserted verbatim
    pub prompt: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.3
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A provider completion, before normalization.
///
/// Providers disagree on payload shape: some return plain text, others a
/// message object with a `content` field. The pipeline never branches on
/// this — it calls [`Completion::into_text`] once at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Completion {
    /// Bare completion text
    Text(String),

    /// A structured message object
    Structured(StructuredMessage),
}

/// A structured provider response exposing a textual payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredMessage {
    /// The textual payload, when the provider exposes one
    #[serde(default)]
    pub content: Option<String>,

    /// Which model actually responded (may differ from requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Provider-specific metadata
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Completion {
    /// Normalize the payload into plain text.
    ///
    /// Structured messages yield their `content` field; a structured message
    /// with no textual field degrades to a string rendering of the whole
    /// payload rather than losing the response.
    pub fn into_text(self) -> String {
        match self {
            Completion::Text(text) => text,
            Completion::Structured(message) => match message.content {
                Some(content) => content,
                None => serde_json::to_string(&message).unwrap_or_default(),
            },
        }
    }
}

impl From<String> for Completion {
    fn from(text: String) -> Self {
        Completion::Text(text)
    }
}

impl From<&str> for Completion {
    fn from(text: &str) -> Self {
        Completion::Text(text.to_string())
    }
}

/// The core LlmClient trait.
///
/// Every LLM backend implements this. Rate limiting, backoff, and fan-out
/// across documents are the client's concern, not the pipeline's — at most
/// one call is in flight per pipeline run.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// A human-readable name for this client (e.g., "openrouter", "ollama").
    fn name(&self) -> &str;

    /// Send a prompt and get a completion.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<Completion, ProviderError>;
}
