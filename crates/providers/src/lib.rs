//! LLM client implementations for Draftsmith.
//!
//! One adapter covers every OpenAI-compatible endpoint; [`build_from_config`]
//! constructs the client named by the configuration. The client handle is
//! created per run and passed in explicitly — no module-level singleton.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatClient;

use std::sync::Arc;

use draftsmith_config::AppConfig;
use draftsmith_core::client::LlmClient;
use draftsmith_core::error::ProviderError;

/// Build the configured LLM client.
///
/// Known names get their convenience constructor; anything else needs an
/// `api_url` in its provider section.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn LlmClient>, ProviderError> {
    let name = config.default_provider.as_str();
    let api_key = config.api_key_for(name);
    let provider_config = config.providers.get(name);

    let client = match name {
        "openrouter" => OpenAiCompatClient::openrouter(require_key(name, api_key)?)?,
        "openai" => OpenAiCompatClient::openai(require_key(name, api_key)?)?,
        "ollama" => OpenAiCompatClient::ollama(
            provider_config.and_then(|p| p.api_url.as_deref()),
        )?,
        other => {
            let url = provider_config
                .and_then(|p| p.api_url.clone())
                .ok_or_else(|| {
                    ProviderError::NotConfigured(format!(
                        "provider '{other}' has no api_url configured"
                    ))
                })?;
            OpenAiCompatClient::new(other, url, api_key.unwrap_or_default())?
        }
    };

    Ok(Arc::new(client))
}

fn require_key(provider: &str, key: Option<String>) -> Result<String, ProviderError> {
    key.ok_or_else(|| ProviderError::NotConfigured(format!("no API key for provider '{provider}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftsmith_config::ProviderConfig;

    #[test]
    fn openrouter_requires_api_key() {
        let config = AppConfig::default();
        let err = match build_from_config(&config) {
            Ok(_) => panic!("expected build_from_config to fail"),
            Err(e) => e,
        };
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn openrouter_builds_with_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("test-key".into());
        let client = build_from_config(&config).unwrap();
        assert_eq!(client.name(), "openrouter");
    }

    #[test]
    fn ollama_needs_no_key() {
        let mut config = AppConfig::default();
        config.default_provider = "ollama".into();
        let client = build_from_config(&config).unwrap();
        assert_eq!(client.name(), "ollama");
    }

    #[test]
    fn custom_provider_requires_url() {
        let mut config = AppConfig::default();
        config.default_provider = "vllm".into();
        assert!(build_from_config(&config).is_err());

        config.providers.insert(
            "vllm".into(),
            ProviderConfig {
                api_key: None,
                api_url: Some("http://localhost:8000/v1".into()),
                default_model: None,
            },
        );
        let client = build_from_config(&config).unwrap();
        assert_eq!(client.name(), "vllm");
    }
}
