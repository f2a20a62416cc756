//! OpenAI Embedding Provider
//!
//! Calls `POST {base_url}/embeddings`. Works with any OpenAI-compatible
//! embedding endpoint through `base_url`.

use async_trait::async_trait;
use serde::Deserialize;

use citerag_llm::http_client::build_http_client;

use super::provider::{
    map_http_status, map_reqwest_error, EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig,
    EmbeddingProviderType, EmbeddingResult,
};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
    requested_dimension: Option<usize>,
}

impl OpenAIEmbeddingProvider {
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
                .unwrap_or(OPENAI_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            model: config.effective_model().to_string(),
            dimension: config.effective_dimension(),
            requested_dimension: config.dimension,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    fn build_request_body(&self, text: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "input": text,
            "encoding_format": "float",
        });
        if let Some(dim) = self.requested_dimension {
            body["dimensions"] = serde_json::json!(dim);
        }
        body
    }

    fn map_http_error(&self, status: u16, body_text: &str) -> EmbeddingError {
        let detail = serde_json::from_str::<OpenAIErrorResponse>(body_text)
            .ok()
            .and_then(|r| r.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| body_text.to_string());
        map_http_status("OpenAI", &self.model, status, &detail)
    }

    fn extract_embedding(&self, response: OpenAIEmbeddingResponse) -> EmbeddingResult<Vec<f32>> {
        let values = response
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::ParseError {
                message: "response contains no embeddings".to_string(),
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
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let endpoint = self.endpoint();
        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.build_request_body(text))
            .send()
            .await
            .map_err(|e| map_reqwest_error("OpenAI", &endpoint, e))?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error("OpenAI", &endpoint, e))?;

        if status != 200 {
            return Err(self.map_http_error(status, &body_text));
        }

        let parsed: OpenAIEmbeddingResponse =
            serde_json::from_str(&body_text).map_err(|e| EmbeddingError::ParseError {
                message: format!("Failed to parse OpenAI embedding response: {}", e),
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
        EmbeddingProviderType::OpenAI
    }

    fn display_name(&self) -> &str {
        "OpenAI"
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    #[serde(default)]
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: Option<OpenAIErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: Option<String>,
}
