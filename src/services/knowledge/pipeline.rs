//! RAG Pipeline
//!
//! Orchestrates the two Retrieval-Augmented Generation flows:
//! - index: chunking -> embedding -> storing
//! - query: retrieving -> reranking -> synthesizing
//!
//! All collaborators are injected at construction. The vector store is the
//! only shared mutable resource; index-clearing and querying are not
//! serialized against each other here.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use citerag_core::{Chunk, Citation};

use super::chunker::{chunking_stats, Chunker, ChunkingStats};
use super::reranker::{Reranker, DEFAULT_RERANK_TOP_K};
use super::retriever::{Retriever, DEFAULT_TOP_K};
use super::synthesizer::AnswerSynthesizer;
use crate::services::vectorstore::{IndexStats, VectorIndexClient};
use crate::utils::error::{AppError, AppResult};

/// Returned instead of a generated answer when retrieval finds nothing.
pub const INSUFFICIENT_CONTEXT_ANSWER: &str =
    "I don't have enough information to answer your question. Please provide some relevant context first.";

/// Model name reported when no model was called.
pub const NO_MODEL: &str = "none";

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Default candidate counts for the query flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_rerank_top_k")]
    pub rerank_top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_rerank_top_k() -> usize {
    DEFAULT_RERANK_TOP_K
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            rerank_top_k: default_rerank_top_k(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.top_k == 0 {
            return Err(AppError::config("retrieval.top_k must be at least 1"));
        }
        if self.rerank_top_k == 0 {
            return Err(AppError::config("retrieval.rerank_top_k must be at least 1"));
        }
        Ok(())
    }
}

/// Summary of one index call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub chunks_created: usize,
    pub avg_chunk_size: usize,
    pub avg_tokens: usize,
    pub total_tokens: usize,
    pub vectors_stored: usize,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    /// Vectors in the store when the query ran.
    pub total_chunks: u64,
    pub retrieved_chunks: usize,
    pub reranked_chunks: usize,
    pub tokens_used: usize,
    pub model: String,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub metadata: QueryMetadata,
}

/// Result of the query flow. Both variants carry a displayable response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Answered(QueryResponse),
    /// Retrieval found nothing; no model was called.
    InsufficientContext(QueryResponse),
}

impl QueryOutcome {
    pub fn response(&self) -> &QueryResponse {
        match self {
            QueryOutcome::Answered(r) | QueryOutcome::InsufficientContext(r) => r,
        }
    }

    pub fn into_response(self) -> QueryResponse {
        match self {
            QueryOutcome::Answered(r) | QueryOutcome::InsufficientContext(r) => r,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, QueryOutcome::Answered(_))
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

// ---------------------------------------------------------------------------
// RagService
// ---------------------------------------------------------------------------

pub struct RagService {
    chunker: Arc<dyn Chunker>,
    client: Arc<VectorIndexClient>,
    retriever: Retriever,
    reranker: Arc<dyn Reranker>,
    synthesizer: AnswerSynthesizer,
    retrieval: RetrievalConfig,
}

impl RagService {
    pub fn new(
        chunker: Arc<dyn Chunker>,
        client: Arc<VectorIndexClient>,
        reranker: Arc<dyn Reranker>,
        synthesizer: AnswerSynthesizer,
        retrieval: RetrievalConfig,
    ) -> AppResult<Self> {
        retrieval.validate()?;
        Ok(Self {
            chunker,
            retriever: Retriever::new(client.clone()),
            client,
            reranker,
            synthesizer,
            retrieval,
        })
    }

    pub fn retrieval_config(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    /// Chunk `text`, embed the chunks and store them.
    ///
    /// With `clear_previous` the store is emptied once chunking has
    /// succeeded. Text that yields no chunk fails with `EmptyInput` and
    /// leaves the store untouched.
    pub async fn index(
        &self,
        text: &str,
        source: &str,
        clear_previous: bool,
    ) -> AppResult<DocumentStats> {
        let started = Instant::now();

        let chunks: Vec<Chunk> = self.chunker.chunk(text, source)?;
        let summary = match chunking_stats(&chunks) {
            ChunkingStats::Summary(summary) => summary,
            ChunkingStats::NoChunks => {
                return Err(AppError::empty_input(format!(
                    "no chunks could be created from {} characters of '{}'",
                    text.chars().count(),
                    source
                )))
            }
        };

        if clear_previous {
            self.client.clear().await?;
            debug!("cleared previous vectors");
        }

        let ids = self.client.store(&chunks).await?;

        let stats = DocumentStats {
            chunks_created: summary.total_chunks,
            avg_chunk_size: summary.avg_chunk_size,
            avg_tokens: summary.avg_tokens,
            total_tokens: summary.total_tokens,
            vectors_stored: ids.len(),
            processing_time_ms: elapsed_ms(started),
        };
        info!(
            source,
            chunks = stats.chunks_created,
            vectors = stats.vectors_stored,
            elapsed_ms = stats.processing_time_ms,
            "indexed document"
        );
        Ok(stats)
    }

    /// Answer `question` from the indexed chunks.
    ///
    /// `top_k` and `rerank_top_k` fall back to the configured defaults.
    pub async fn query(
        &self,
        question: &str,
        top_k: Option<usize>,
        rerank_top_k: Option<usize>,
    ) -> AppResult<QueryOutcome> {
        let started = Instant::now();
        let top_k = top_k.unwrap_or(self.retrieval.top_k);
        let rerank_top_k = rerank_top_k.unwrap_or(self.retrieval.rerank_top_k);
        if top_k == 0 || rerank_top_k == 0 {
            return Err(AppError::validation(format!(
                "top_k and rerank_top_k must be greater than 0, got {} and {}",
                top_k, rerank_top_k
            )));
        }

        let candidates = self.retriever.retrieve(question, top_k).await?;
        if candidates.is_empty() {
            warn!("no indexed context matched the question");
            return Ok(QueryOutcome::InsufficientContext(QueryResponse {
                answer: INSUFFICIENT_CONTEXT_ANSWER.to_string(),
                citations: Vec::new(),
                metadata: QueryMetadata {
                    total_chunks: 0,
                    retrieved_chunks: 0,
                    reranked_chunks: 0,
                    tokens_used: 0,
                    model: NO_MODEL.to_string(),
                    processing_time_ms: elapsed_ms(started),
                },
            }));
        }
        let retrieved = candidates.len();

        let reranked = self.reranker.rerank(question, candidates, rerank_top_k).await?;
        let answer = self.synthesizer.generate(question, &reranked).await?;
        let total_chunks = self.client.stats().await?.total_vectors;

        let metadata = QueryMetadata {
            total_chunks,
            retrieved_chunks: retrieved,
            reranked_chunks: reranked.len(),
            tokens_used: answer.tokens_used,
            model: answer.model_name,
            processing_time_ms: elapsed_ms(started),
        };
        info!(
            retrieved = metadata.retrieved_chunks,
            reranked = metadata.reranked_chunks,
            tokens = metadata.tokens_used,
            elapsed_ms = metadata.processing_time_ms,
            "answered query"
        );

        Ok(QueryOutcome::Answered(QueryResponse {
            answer: answer.answer,
            citations: answer.citations,
            metadata,
        }))
    }

    pub async fn get_stats(&self) -> AppResult<IndexStats> {
        self.client.stats().await
    }

    pub async fn clear_all(&self) -> AppResult<()> {
        self.client.clear().await?;
        info!("cleared all vectors");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
