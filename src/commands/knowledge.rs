//! Knowledge Base Commands
//!
//! Index, query, stats and clear operations over the RAG service.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::response::CommandResponse;
use crate::services::extract::{extract_text, mime_type_for_path};
use crate::services::knowledge::pipeline::{DocumentStats, QueryOutcome, RagService};
use crate::services::vectorstore::IndexStats;
use crate::utils::error::{AppError, AppResult};

/// Shortest text accepted for indexing.
pub const MIN_INDEX_TEXT_CHARS: usize = 50;

/// Shortest question accepted for querying.
pub const MIN_QUESTION_CHARS: usize = 3;

/// Source label used when the caller gives none.
pub const DEFAULT_SOURCE: &str = "user_input";

/// Request for document indexing.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexRequest {
    pub text: String,
    pub source: Option<String>,
    /// Defaults to true: each index call replaces the previous content.
    pub clear_previous: Option<bool>,
}

impl IndexRequest {
    pub fn validate(&self) -> AppResult<()> {
        let chars = self.text.trim().chars().count();
        if chars < MIN_INDEX_TEXT_CHARS {
            return Err(AppError::validation(format!(
                "text must be at least {} characters, got {}",
                MIN_INDEX_TEXT_CHARS, chars
            )));
        }
        Ok(())
    }
}

/// Request for querying the index.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub top_k: Option<usize>,
    pub rerank_top_k: Option<usize>,
}

impl QueryRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.question.trim().chars().count() < MIN_QUESTION_CHARS {
            return Err(AppError::validation(format!(
                "question must be at least {} characters",
                MIN_QUESTION_CHARS
            )));
        }
        if self.top_k == Some(0) || self.rerank_top_k == Some(0) {
            return Err(AppError::validation("top_k values must be at least 1"));
        }
        Ok(())
    }
}

/// Confirmation returned by `clear_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResult {
    pub cleared: bool,
}

/// Read a file and extract its text, guessing the type from the extension.
pub fn read_document(path: &Path) -> AppResult<String> {
    let bytes = std::fs::read(path)?;
    let mime = mime_type_for_path(path);
    debug!(path = %path.display(), mime, bytes = bytes.len(), "reading document");
    extract_text(&bytes, mime)
}

/// Chunk, embed and store a document.
pub async fn index_document(rag: &RagService, request: IndexRequest) -> CommandResponse<DocumentStats> {
    if let Err(e) = request.validate() {
        return CommandResponse::err(e.to_string());
    }
    let source = request.source.as_deref().unwrap_or(DEFAULT_SOURCE);
    let clear_previous = request.clear_previous.unwrap_or(true);
    rag.index(&request.text, source, clear_previous).await.into()
}

/// Answer a question from the indexed content.
pub async fn query_knowledge(rag: &RagService, request: QueryRequest) -> CommandResponse<QueryOutcome> {
    if let Err(e) = request.validate() {
        return CommandResponse::err(e.to_string());
    }
    rag.query(request.question.trim(), request.top_k, request.rerank_top_k)
        .await
        .into()
}

pub async fn get_index_stats(rag: &RagService) -> CommandResponse<IndexStats> {
    rag.get_stats().await.into()
}

pub async fn clear_index(rag: &RagService) -> CommandResponse<ClearResult> {
    rag.clear_all()
        .await
        .map(|()| ClearResult { cleared: true })
        .into()
}
