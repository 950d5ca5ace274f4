//! Error types for the Draftsmith domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Draftsmith operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Validation errors ---
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors raised inside the validation rule engine.
///
/// These never abort the formatting loop: the orchestrator converts them
/// into a zero-score attempt record and keeps the message for diagnosis.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Rubric check '{check}' could not run: {reason}")]
    RuleFailed { check: String, reason: String },

    #[error("Invalid rubric weights: {0}")]
    InvalidWeights(String),

    #[error("Document too large to validate: {bytes} bytes (limit {limit})")]
    DocumentTooLarge { bytes: usize, limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn validation_error_displays_correctly() {
        let err = Error::Validation(ValidationError::RuleFailed {
            check: "tldr_section".into(),
            reason: "pattern did not compile".into(),
        });
        assert!(err.to_string().contains("tldr_section"));
        assert!(err.to_string().contains("pattern did not compile"));
    }
}
