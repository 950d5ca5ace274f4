//! Configuration loading, validation, and management for Draftsmith.
//!
//! Loads configuration from `~/.draftsmith/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use draftsmith_core::report::RubricWeights;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.draftsmith/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Formatting loop configuration
    #[serde(default)]
    pub formatting: FormattingConfig,

    /// Persona voice configuration
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Title generation configuration
    #[serde(default)]
    pub titles: TitleConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    8192
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("formatting", &self.formatting)
            .field("persona", &self.persona)
            .field("titles", &self.titles)
            .field("providers", &self.providers)
            .finish()
    }
}

/// Settings for the formatting retry loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattingConfig {
    /// Ceiling on formatting attempts per document
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Score at which a candidate is accepted without further retries
    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: f64,

    /// Per-check rubric weights
    #[serde(default)]
    pub weights: RubricWeights,
}

fn default_max_retries() -> u32 {
    3
}
fn default_accept_threshold() -> f64 {
    0.85
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            accept_threshold: default_accept_threshold(),
            weights: RubricWeights::default(),
        }
    }
}

/// Persona voice settings, injected verbatim into formatting prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Persona name, for logging
    #[serde(default = "default_persona_name")]
    pub name: String,

    /// Free-text style guidance; empty string means no persona voice
    #[serde(default)]
    pub guidance: String,
}

fn default_persona_name() -> String {
    "neutral".into()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            guidance: String::new(),
        }
    }
}

/// Title generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleConfig {
    /// How many title options to request
    #[serde(default = "default_num_titles")]
    pub num_titles: u32,
}

fn default_num_titles() -> u32 {
    3
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            num_titles: default_num_titles(),
        }
    }
}

/// Per-provider connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider-specific API key (overrides the global key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for the provider's API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Default model for this provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.draftsmith/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `DRAFTSMITH_API_KEY` (highest priority)
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("DRAFTSMITH_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("DRAFTSMITH_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("DRAFTSMITH_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".draftsmith")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.formatting.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "formatting.max_retries must be at least 1".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.formatting.accept_threshold) {
            return Err(ConfigError::ValidationError(
                "formatting.accept_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        self.formatting
            .weights
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Resolve the API key for a named provider, falling back to the global key.
    pub fn api_key_for(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Generate a default config TOML string (for first-run setup).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            formatting: FormattingConfig::default(),
            persona: PersonaConfig::default(),
            titles: TitleConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_provider, "openrouter");
        assert_eq!(config.formatting.max_retries, 3);
        assert!((config.formatting.accept_threshold - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.formatting.max_retries, config.formatting.max_retries);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retries_rejected() {
        let mut config = AppConfig::default();
        config.formatting.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let mut config = AppConfig::default();
        config.formatting.accept_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().default_provider, "openrouter");
    }

    #[test]
    fn formatting_weights_parse_from_toml() {
        let toml_str = r#"
[formatting]
max_retries = 2
accept_threshold = 0.9

[formatting.weights]
tldr_section = 2.0
callouts = 0.5
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.formatting.max_retries, 2);
        assert!((config.formatting.weights.tldr_section - 2.0).abs() < f64::EPSILON);
        assert!((config.formatting.weights.callouts - 0.5).abs() < f64::EPSILON);
        // Unspecified checks keep the default weight.
        assert!((config.formatting.weights.dividers - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn persona_guidance_parses() {
        let toml_str = r#"
[persona]
name = "neuraforge"
guidance = "Write like a practitioner sharing hard-won insight."
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.persona.name, "neuraforge");
        assert!(config.persona.guidance.contains("practitioner"));
    }

    #[test]
    fn provider_key_falls_back_to_global() {
        let mut config = AppConfig::default();
        config.api_key = Some("global-key".into());
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_key: Some("local-key".into()),
                api_url: None,
                default_model: None,
            },
        );

        assert_eq!(config.api_key_for("ollama").as_deref(), Some("local-key"));
        assert_eq!(
            config.api_key_for("openrouter").as_deref(),
            Some("global-key")
        );
    }

    #[test]
    fn debug_output_redacts_keys() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn load_from_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "default_model = \"gpt-4o\"\n\n[formatting]\nmax_retries = 5").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.formatting.max_retries, 5);
    }
}
