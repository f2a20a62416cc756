//! Embedding Provider Abstraction Layer
//!
//! Defines the async `EmbeddingProvider` trait and supporting types for
//! pluggable embedding backends. Each backend (Gemini, OpenAI, local hashing)
//! implements this trait to provide a unified `text -> vector` interface.
//!
//! Embedding is a distinct responsibility from text generation, so it does not
//! extend `LlmProvider`. Batching across texts lives in
//! [`EmbeddingGateway`](super::gateway::EmbeddingGateway), not here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use citerag_core::proxy::ProxyConfig;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during embedding operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbeddingError {
    /// Authentication failed (invalid or missing API key).
    AuthenticationFailed { message: String },

    /// The requested model was not found or is not available.
    ModelNotFound { model: String },

    /// The provider is not reachable.
    ProviderUnavailable { message: String },

    /// The input text exceeds the provider's maximum token/character limit.
    InputTooLong { message: String },

    /// A network or connection error occurred.
    NetworkError { message: String },

    /// The provider returned an unexpected or unparseable response.
    ParseError { message: String },

    /// The provider returned an HTTP error.
    ServerError {
        message: String,
        status: Option<u16>,
    },

    /// Rate limit exceeded.
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },

    /// Configuration is invalid or incomplete.
    InvalidConfig { message: String },

    /// The returned vector does not have the expected length.
    DimensionMismatch { expected: usize, actual: usize },

    /// Any other error.
    Other { message: String },
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticationFailed { message } => {
                write!(f, "authentication failed: {}", message)
            }
            Self::ModelNotFound { model } => write!(f, "model not found: {}", model),
            Self::ProviderUnavailable { message } => {
                write!(f, "provider unavailable: {}", message)
            }
            Self::InputTooLong { message } => write!(f, "input too long: {}", message),
            Self::NetworkError { message } => write!(f, "network error: {}", message),
            Self::ParseError { message } => write!(f, "parse error: {}", message),
            Self::ServerError { message, status } => {
                if let Some(code) = status {
                    write!(f, "server error (HTTP {}): {}", code, message)
                } else {
                    write!(f, "server error: {}", message)
                }
            }
            Self::RateLimited { message, .. } => write!(f, "rate limited: {}", message),
            Self::InvalidConfig { message } => write!(f, "invalid config: {}", message),
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "embedding has {} dimensions, expected {}",
                actual, expected
            ),
            Self::Other { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for EmbeddingError {}

impl EmbeddingError {
    /// Whether this error is transient and the operation could be retried
    /// by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EmbeddingError::NetworkError { .. }
                | EmbeddingError::RateLimited { .. }
                | EmbeddingError::ServerError { .. }
                | EmbeddingError::ProviderUnavailable { .. }
        )
    }
}

/// Convenience alias for embedding operation results.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Map a transport failure into an `EmbeddingError`.
pub(crate) fn map_reqwest_error(label: &str, endpoint: &str, err: reqwest::Error) -> EmbeddingError {
    if err.is_connect() {
        EmbeddingError::ProviderUnavailable {
            message: format!("Cannot connect to {} at {}: {}", label, endpoint, err),
        }
    } else if err.is_timeout() {
        EmbeddingError::NetworkError {
            message: format!("Request to {} timed out: {}", label, err),
        }
    } else {
        EmbeddingError::NetworkError {
            message: err.to_string(),
        }
    }
}

/// Map a non-success HTTP status into an `EmbeddingError`.
///
/// `detail` is the provider's error message when one could be extracted,
/// otherwise the raw body.
pub(crate) fn map_http_status(label: &str, model: &str, status: u16, detail: &str) -> EmbeddingError {
    match status {
        401 | 403 => EmbeddingError::AuthenticationFailed {
            message: format!("{}: {}", label, detail),
        },
        429 => EmbeddingError::RateLimited {
            message: format!("{} rate limit exceeded: {}", label, detail),
            retry_after: None,
        },
        400 => {
            if detail.contains("token") || detail.contains("length") || detail.contains("size") {
                EmbeddingError::InputTooLong {
                    message: format!("{}: {}", label, detail),
                }
            } else {
                EmbeddingError::InvalidConfig {
                    message: format!("{} bad request: {}", label, detail),
                }
            }
        }
        404 => EmbeddingError::ModelNotFound {
            model: format!("'{}' ({}): {}", model, label, detail),
        },
        500..=599 => EmbeddingError::ServerError {
            message: format!("{}: {}", label, detail),
            status: Some(status),
        },
        _ => EmbeddingError::Other {
            message: format!("{} returned HTTP {}: {}", label, status, detail),
        },
    }
}

// ---------------------------------------------------------------------------
// Provider type enum
// ---------------------------------------------------------------------------

/// Identifies the embedding backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderType {
    /// Google Gemini embedding models (text-embedding-004).
    Gemini,
    /// OpenAI embedding models (text-embedding-3-small, etc.).
    #[serde(rename = "openai")]
    OpenAI,
    /// Local feature-hashed bag of words. No network, deterministic.
    Hashing,
}

impl EmbeddingProviderType {
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "text-embedding-004",
            Self::OpenAI => "text-embedding-3-small",
            Self::Hashing => "hashing",
        }
    }

    pub fn default_dimension(&self) -> usize {
        match self {
            Self::Gemini => 768,
            Self::OpenAI => 1536,
            Self::Hashing => 256,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Hashing)
    }
}

impl fmt::Display for EmbeddingProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::OpenAI => write!(f, "openai"),
            Self::Hashing => write!(f, "hashing"),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider configuration
// ---------------------------------------------------------------------------

/// Configuration for an embedding provider instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingProviderConfig {
    /// The embedding backend type.
    pub provider: EmbeddingProviderType,

    /// Model identifier (e.g., "text-embedding-004").
    pub model: String,

    /// API key for remote providers, resolved from the environment.
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,

    /// Base URL override for the provider API.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_url: Option<String>,

    /// Desired embedding dimension. If `None`, the provider's default is used.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dimension: Option<usize>,

    /// Upper bound on in-flight embedding calls during batch embedding.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Proxy for outbound requests. None means a direct connection.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub proxy: Option<ProxyConfig>,
}

fn default_max_concurrency() -> usize {
    8
}

impl Default for EmbeddingProviderConfig {
    fn default() -> Self {
        Self::new(EmbeddingProviderType::Gemini)
    }
}

impl EmbeddingProviderConfig {
    /// Create a new configuration with sensible defaults for the given provider type.
    pub fn new(provider: EmbeddingProviderType) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: None,
            base_url: None,
            dimension: None,
            max_concurrency: default_max_concurrency(),
            proxy: None,
        }
    }

    /// Validate the static parts of the configuration.
    ///
    /// API key presence is not checked here; it is resolved from the
    /// environment after the file is loaded and checked when the provider
    /// is built.
    pub fn validate(&self) -> EmbeddingResult<()> {
        if self.model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                message: "model name must not be empty".to_string(),
            });
        }
        if self.max_concurrency == 0 {
            return Err(EmbeddingError::InvalidConfig {
                message: "max_concurrency must be at least 1".to_string(),
            });
        }
        if self.dimension == Some(0) {
            return Err(EmbeddingError::InvalidConfig {
                message: "dimension must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the effective dimension: the configured dimension or the provider's default.
    pub fn effective_dimension(&self) -> usize {
        self.dimension
            .unwrap_or_else(|| self.provider.default_dimension())
    }

    /// Returns the effective model name (trimmed).
    pub fn effective_model(&self) -> &str {
        self.model.trim()
    }

    /// The API key, or `AuthenticationFailed` if the provider needs one.
    pub(crate) fn require_api_key(&self) -> EmbeddingResult<String> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(EmbeddingError::AuthenticationFailed {
                message: format!("API key not configured for {} embeddings", self.provider),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Async, object-safe interface over an embedding backend.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text into a fixed-length vector.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Verify the provider is reachable and configured.
    async fn health_check(&self) -> EmbeddingResult<()> {
        self.embed("health check").await.map(|_| ())
    }

    /// Whether embeddings are computed in-process.
    fn is_local(&self) -> bool;

    fn provider_type(&self) -> EmbeddingProviderType;

    fn display_name(&self) -> &str;
}
