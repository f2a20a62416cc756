//! Vector Store
//!
//! ANN backends behind `VectorIndexService` and the text-level
//! `VectorIndexClient` the retriever and orchestrator use.

pub mod client;
pub mod hnsw_index;
pub mod pinecone;
pub mod service;

use std::sync::Arc;

pub use client::VectorIndexClient;
pub use hnsw_index::HnswVectorIndex;
pub use pinecone::PineconeIndex;
pub use service::{
    IndexStats, StoreError, StoreResult, VectorIndexService, VectorMatch, VectorStoreBackend,
    VectorStoreConfig,
};

/// Build the configured backend. `dimension` sizes the in-process index.
pub fn create_index(
    config: &VectorStoreConfig,
    dimension: usize,
) -> StoreResult<Arc<dyn VectorIndexService>> {
    config.validate()?;
    let index: Arc<dyn VectorIndexService> = match config.backend {
        VectorStoreBackend::Pinecone => Arc::new(PineconeIndex::new(config)?),
        VectorStoreBackend::Hnsw => Arc::new(HnswVectorIndex::new(dimension, config.max_elements)?),
    };
    Ok(index)
}
