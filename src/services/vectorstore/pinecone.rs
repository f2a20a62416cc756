//! Pinecone Vector Index
//!
//! Talks to a Pinecone index over its REST data plane. The index is expected
//! to use the cosine metric, so match scores are already similarities.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use citerag_core::VectorRecord;
use citerag_llm::http_client::build_http_client;

use super::service::{
    IndexStats, StoreError, StoreResult, VectorIndexService, VectorMatch, VectorStoreConfig,
};

const API_VERSION: &str = "2024-07";

/// Pinecone caps upsert payloads; 100 vectors per request stays well below it.
const UPSERT_BATCH_SIZE: usize = 100;

pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    host: String,
}

impl PineconeIndex {
    pub fn new(config: &VectorStoreConfig) -> StoreResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StoreError::InvalidConfig {
                message: "PINECONE_API_KEY is not set".to_string(),
            })?
            .to_string();
        let host = config
            .index_host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| StoreError::InvalidConfig {
                message: "Pinecone index host is not configured (PINECONE_INDEX_HOST)".to_string(),
            })?;
        let client = build_http_client(config.proxy.as_ref()).map_err(|e| StoreError::InvalidConfig {
            message: format!("failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            api_key,
            host: normalize_host(host),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> StoreResult<(u16, String)> {
        let response = self
            .client
            .post(self.url(path))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.map_reqwest_error(e))?;
        Ok((status, text))
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_connect() || err.is_timeout() {
            StoreError::Unavailable {
                message: format!("cannot reach Pinecone at {}: {}", self.host, err),
            }
        } else {
            StoreError::Other {
                message: err.to_string(),
            }
        }
    }

    fn map_http_error(status: u16, body: &str) -> StoreError {
        let detail = serde_json::from_str::<PineconeErrorResponse>(body)
            .ok()
            .and_then(|r| r.message.or_else(|| r.error.and_then(|e| e.message)))
            .unwrap_or_else(|| body.to_string());
        match status {
            401 | 403 => StoreError::AuthenticationFailed { message: detail },
            404 => StoreError::IndexNotFound { message: detail },
            429 => StoreError::RateLimited { message: detail },
            400 | 422 => StoreError::InvalidRequest { message: detail },
            500..=599 => StoreError::ServerError {
                message: detail,
                status: Some(status),
            },
            _ => StoreError::Other {
                message: format!("HTTP {}: {}", status, detail),
            },
        }
    }

    fn parse<T: for<'de> Deserialize<'de>>(body: &str) -> StoreResult<T> {
        serde_json::from_str(body).map_err(|e| StoreError::ParseError {
            message: format!("Failed to parse Pinecone response: {}", e),
        })
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn upsert_body(records: &[VectorRecord]) -> Value {
    let vectors: Vec<Value> = records
        .iter()
        .map(|r| {
            serde_json::json!({
                "id": r.id,
                "values": r.values,
                "metadata": r.metadata_map(),
            })
        })
        .collect();
    serde_json::json!({ "vectors": vectors })
}

#[async_trait]
impl VectorIndexService for PineconeIndex {
    async fn upsert(&self, records: &[VectorRecord]) -> StoreResult<()> {
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            let (status, body) = self.post("/vectors/upsert", &upsert_body(batch)).await?;
            if status != 200 {
                return Err(Self::map_http_error(status, &body));
            }
            debug!(count = batch.len(), "Pinecone upsert batch");
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> StoreResult<Vec<VectorMatch>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let request = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": include_metadata,
            "includeValues": false,
        });
        let (status, body) = self.post("/query", &request).await?;
        if status != 200 {
            return Err(Self::map_http_error(status, &body));
        }

        let parsed: QueryResponse = Self::parse(&body)?;
        Ok(parsed
            .matches
            .into_iter()
            .map(|m| VectorMatch {
                id: m.id,
                score: m.score.unwrap_or(0.0),
                metadata: m.metadata,
            })
            .collect())
    }

    async fn delete_all(&self) -> StoreResult<()> {
        let (status, body) = self
            .post("/vectors/delete", &serde_json::json!({ "deleteAll": true }))
            .await?;
        match status {
            200 => {}
            // Serverless indexes report an empty default namespace as missing.
            404 => debug!("Pinecone deleteAll on empty namespace"),
            _ => return Err(Self::map_http_error(status, &body)),
        }
        info!(host = %self.host, "Pinecone index cleared");
        Ok(())
    }

    async fn describe_stats(&self) -> StoreResult<IndexStats> {
        let (status, body) = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await?;
        if status != 200 {
            return Err(Self::map_http_error(status, &body));
        }
        let parsed: DescribeStatsResponse = Self::parse(&body)?;
        Ok(IndexStats {
            total_vectors: parsed.total_vector_count,
            dimension: parsed.dimension,
            index_fullness: parsed.index_fullness,
        })
    }

    fn name(&self) -> &'static str {
        "pinecone"
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    score: Option<f32>,
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeStatsResponse {
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    index_fullness: f32,
    #[serde(default)]
    total_vector_count: u64,
}

#[derive(Debug, Deserialize)]
struct PineconeErrorResponse {
    message: Option<String>,
    error: Option<PineconeErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct PineconeErrorDetail {
    message: Option<String>,
}
