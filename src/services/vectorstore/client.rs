//! Vector Index Client
//!
//! Text-level facade over a [`VectorIndexService`]: embeds chunks and
//! questions through the [`EmbeddingGateway`], assigns ids, and normalizes
//! raw matches into [`SearchResult`]s. Failures are surfaced immediately;
//! nothing here retries.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use citerag_core::{Chunk, SearchResult, VectorRecord};

use super::service::{IndexStats, VectorIndexService};
use crate::services::embedding::EmbeddingGateway;
use crate::utils::error::AppResult;

pub struct VectorIndexClient {
    index: Arc<dyn VectorIndexService>,
    gateway: Arc<EmbeddingGateway>,
}

impl VectorIndexClient {
    pub fn new(index: Arc<dyn VectorIndexService>, gateway: Arc<EmbeddingGateway>) -> Self {
        Self { index, gateway }
    }

    /// Embed and upsert `chunks`, returning the assigned ids in chunk order.
    pub async fn store(&self, chunks: &[Chunk]) -> AppResult<Vec<String>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.gateway.embed_batch(&texts).await?;

        let timestamp = Utc::now().to_rfc3339();
        let mut seen = HashSet::with_capacity(chunks.len());
        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, values)| VectorRecord {
                id: unique_id(&mut seen),
                values,
                chunk: chunk.clone(),
                timestamp: timestamp.clone(),
            })
            .collect();

        self.index.upsert(&records).await?;

        info!(
            count = records.len(),
            backend = self.index.name(),
            "stored chunk vectors"
        );
        Ok(records.into_iter().map(|r| r.id).collect())
    }

    /// Embed `query` and return up to `top_k` results, most similar first.
    pub async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<SearchResult>> {
        let vector = self.gateway.embed(query).await?;
        let matches = self.index.query(&vector, top_k, true).await?;

        let mut results = matches
            .iter()
            .map(|m| SearchResult::from_match(&m.id, m.score, m.metadata.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);

        debug!(top_k, returned = results.len(), "vector search");
        Ok(results)
    }

    /// Remove every stored vector.
    pub async fn clear(&self) -> AppResult<()> {
        self.index.delete_all().await?;
        Ok(())
    }

    pub async fn stats(&self) -> AppResult<IndexStats> {
        Ok(self.index.describe_stats().await?)
    }
}

/// `doc_{unix_millis}_{9 random chars}`, unique within `seen`.
fn unique_id(seen: &mut HashSet<String>) -> String {
    loop {
        let random = Uuid::new_v4().simple().to_string();
        let id = format!("doc_{}_{}", Utc::now().timestamp_millis(), &random[..9]);
        if seen.insert(id.clone()) {
            return id;
        }
    }
}
