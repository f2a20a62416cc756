//! LLM Provider Trait
//!
//! Defines the common interface for all generative model providers.

use std::sync::Arc;

use async_trait::async_trait;

use super::gemini::GeminiProvider;
use super::openai::OpenAIProvider;
use super::types::{GenerationOptions, LlmError, LlmResponse, LlmResult, ProviderConfig, ProviderType};

/// Trait that all LLM providers must implement.
///
/// The pipeline only needs single-shot text completion: prompt in, text out.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Generate a complete response for a single user prompt.
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> LlmResult<LlmResponse>;
}

/// Construct the provider selected by `config`.
pub fn create_provider(config: ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderType::Gemini => Arc::new(GeminiProvider::new(config)?),
        ProviderType::OpenAI => Arc::new(OpenAIProvider::new(config)?),
    };
    Ok(provider)
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}

/// Map a transport failure from reqwest.
pub(crate) fn network_error(err: reqwest::Error) -> LlmError {
    LlmError::NetworkError {
        message: err.to_string(),
    }
}
