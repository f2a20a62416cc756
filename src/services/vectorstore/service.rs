//! Vector Index Service Abstraction
//!
//! The contract every ANN backend fulfils: upsert records, query by vector,
//! wipe everything, describe the index. Scores returned by `query` are
//! similarities (higher is closer) regardless of the backend's native metric.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use citerag_core::proxy::ProxyConfig;
use citerag_core::VectorRecord;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by a vector index backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreError {
    /// The service could not be reached.
    Unavailable { message: String },
    /// Authentication failed (invalid or missing API key).
    AuthenticationFailed { message: String },
    /// The index or namespace does not exist.
    IndexNotFound { message: String },
    /// Rate limit exceeded.
    RateLimited { message: String },
    /// The service rejected the request.
    InvalidRequest { message: String },
    /// The service returned a 5xx.
    ServerError {
        message: String,
        status: Option<u16>,
    },
    /// A vector does not match the index dimension.
    DimensionMismatch { expected: usize, actual: usize },
    /// The service returned an unexpected or unparseable response.
    ParseError { message: String },
    /// Configuration is invalid or incomplete.
    InvalidConfig { message: String },
    /// Any other error.
    Other { message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { message } => write!(f, "index unavailable: {}", message),
            Self::AuthenticationFailed { message } => {
                write!(f, "authentication failed: {}", message)
            }
            Self::IndexNotFound { message } => write!(f, "index not found: {}", message),
            Self::RateLimited { message } => write!(f, "rate limited: {}", message),
            Self::InvalidRequest { message } => write!(f, "invalid request: {}", message),
            Self::ServerError { message, status } => match status {
                Some(code) => write!(f, "server error (HTTP {}): {}", code, message),
                None => write!(f, "server error: {}", message),
            },
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "vector has {} dimensions, index expects {}",
                actual, expected
            ),
            Self::ParseError { message } => write!(f, "parse error: {}", message),
            Self::InvalidConfig { message } => write!(f, "invalid config: {}", message),
            Self::Other { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::RateLimited { .. } | StoreError::ServerError { .. }
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One hit from a similarity query, still in the backend's metadata shape.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub id: String,
    /// Similarity, higher is closer.
    pub score: f32,
    pub metadata: Option<Map<String, Value>>,
}

/// Index summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total_vectors: u64,
    pub dimension: usize,
    /// Fraction of capacity in use, in `[0, 1]`.
    pub index_fullness: f32,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreBackend {
    /// Pinecone serverless/pod index over its REST data plane.
    Pinecone,
    /// In-process HNSW graph. Contents do not survive the process.
    Hnsw,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    pub backend: VectorStoreBackend,
    /// Pinecone index host, e.g. `my-index-abc123.svc.us-east-1.pinecone.io`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub index_host: Option<String>,
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    /// Capacity hint for the in-process index.
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub proxy: Option<ProxyConfig>,
}

fn default_max_elements() -> usize {
    100_000
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorStoreBackend::Pinecone,
            index_host: None,
            api_key: None,
            max_elements: default_max_elements(),
            proxy: None,
        }
    }
}

impl VectorStoreConfig {
    pub fn validate(&self) -> StoreResult<()> {
        if self.max_elements == 0 {
            return Err(StoreError::InvalidConfig {
                message: "max_elements must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait VectorIndexService: Send + Sync {
    /// Insert or replace records by id.
    async fn upsert(&self, records: &[VectorRecord]) -> StoreResult<()>;

    /// Return up to `top_k` matches ordered by descending similarity.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> StoreResult<Vec<VectorMatch>>;

    /// Remove every stored vector.
    async fn delete_all(&self) -> StoreResult<()>;

    async fn describe_stats(&self) -> StoreResult<IndexStats>;

    fn name(&self) -> &'static str;
}
