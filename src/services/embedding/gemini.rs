//! Gemini Embedding Provider
//!
//! Calls the Generative Language API `models/{model}:embedContent` endpoint,
//! one text per request. Default model is `text-embedding-004` (768 dims).

use async_trait::async_trait;
use serde::Deserialize;

use citerag_llm::http_client::build_http_client;

use super::provider::{
    map_http_status, map_reqwest_error, EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig,
    EmbeddingProviderType, EmbeddingResult,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Embedding provider backed by Gemini `embedContent`.
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
    /// Sent as `outputDimensionality` only when explicitly configured.
    requested_dimension: Option<usize>,
}

impl GeminiEmbeddingProvider {
    pub fn new(config: &EmbeddingProviderConfig) -> EmbeddingResult<Self> {
        let api_key = config.require_api_key()?;
        let client = build_http_client(config.proxy.as_ref()).map_err(|e| EmbeddingError::InvalidConfig {
            message: format!("failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            api_key,
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(GEMINI_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            model: config.effective_model().to_string(),
            dimension: config.effective_dimension(),
            requested_dimension: config.dimension,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:embedContent", self.base_url, self.model)
    }

    fn build_request_body(&self, text: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] },
        });
        if let Some(dim) = self.requested_dimension {
            body["outputDimensionality"] = serde_json::json!(dim);
        }
        body
    }

    fn map_http_error(&self, status: u16, body_text: &str) -> EmbeddingError {
        let detail = serde_json::from_str::<GeminiErrorResponse>(body_text)
            .ok()
            .and_then(|r| r.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| body_text.to_string());
        map_http_status("Gemini", &self.model, status, &detail)
    }

    fn extract_embedding(&self, response: EmbedContentResponse) -> EmbeddingResult<Vec<f32>> {
        let values = response
            .embedding
            .map(|e| e.values)
            .ok_or_else(|| EmbeddingError::ParseError {
                message: "response has no embedding".to_string(),
            })?;
        if values.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: values.len(),
            });
        }
        Ok(values)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let endpoint = self.endpoint();
        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request_body(text))
            .send()
            .await
            .map_err(|e| map_reqwest_error("Gemini", &endpoint, e))?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error("Gemini", &endpoint, e))?;

        if status != 200 {
            return Err(self.map_http_error(status, &body_text));
        }

        let parsed: EmbedContentResponse =
            serde_json::from_str(&body_text).map_err(|e| EmbeddingError::ParseError {
                message: format!("Failed to parse Gemini embedding response: {}", e),
            })?;
        self.extract_embedding(parsed)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn is_local(&self) -> bool {
        false
    }

    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::Gemini
    }

    fn display_name(&self) -> &str {
        "Gemini"
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: Option<String>,
}
