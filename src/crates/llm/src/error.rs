//! Error types for chat model providers.

use thiserror::Error;

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when talking to a chat model backend.
///
/// An empty-but-well-formed completion is *not* an error; callers receive it
/// as a successful response with empty content. These variants cover
/// connectivity, authentication, and malformed payloads.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed (connection refused, DNS, TLS, ...).
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Request exceeded the configured timeout.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Backend service is unreachable (e.g. Ollama not running).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// API authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// API key not found in the environment.
    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Response body did not match the provider's wire format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Failed to serialize/deserialize request data.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Provider returned a non-success status not covered above.
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Check if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::HttpError(_)
                | LlmError::Timeout(_)
                | LlmError::ServiceUnavailable(_)
                | LlmError::RateLimitExceeded(_)
        )
    }

    /// Check if this error is due to authentication.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            LlmError::AuthenticationError(_) | LlmError::ApiKeyNotFound(_)
        )
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(err.to_string())
        } else if err.is_connect() {
            LlmError::ServiceUnavailable(err.to_string())
        } else {
            LlmError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}
