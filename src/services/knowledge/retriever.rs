//! Retriever
//!
//! First stage of a query: nearest-neighbour candidates from the vector index.

use std::sync::Arc;

use tracing::debug;

use citerag_core::SearchResult;

use crate::services::vectorstore::VectorIndexClient;
use crate::utils::error::{AppError, AppResult};

/// Candidates fetched when the caller does not ask for a specific count.
pub const DEFAULT_TOP_K: usize = 8;

pub struct Retriever {
    client: Arc<VectorIndexClient>,
}

impl Retriever {
    pub fn new(client: Arc<VectorIndexClient>) -> Self {
        Self { client }
    }

    /// Up to `top_k` chunks for `question`, most similar first.
    ///
    /// An empty index yields an empty list. Store and embedding failures
    /// propagate unchanged.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> AppResult<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(AppError::validation("top_k must be at least 1"));
        }
        let results = self.client.search(question, top_k).await?;
        debug!(top_k, retrieved = results.len(), "retrieved candidates");
        Ok(results)
    }
}
