//! Application State
//!
//! Builds every service once from the loaded configuration and hands the
//! wired `RagService` to the command layer.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use citerag_llm::create_provider;

use crate::models::settings::AppConfig;
use crate::services::embedding::EmbeddingGateway;
use crate::services::knowledge::{
    AnswerSynthesizer, HeuristicReranker, NoopReranker, RagService, Reranker, SlidingWindowChunker,
};
use crate::services::vectorstore::{create_index, VectorIndexClient};
use crate::storage::ConfigService;
use crate::utils::error::AppResult;

pub struct AppState {
    config: AppConfig,
    rag: Arc<RagService>,
}

impl AppState {
    /// Load configuration from `config_path` (or the default location) and
    /// build all services.
    pub fn initialize(config_path: Option<&Path>) -> AppResult<Self> {
        let service = match config_path {
            Some(path) => ConfigService::load(path)?,
            None => ConfigService::new()?,
        };
        Self::from_config(service.get_config().clone())
    }

    /// Wire the pipeline from an already resolved configuration.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        let chunker = Arc::new(SlidingWindowChunker::new(config.chunking.clone())?);

        let gateway = EmbeddingGateway::from_config(&config.embedding)?;
        let index = create_index(&config.vector_store, gateway.dimension())?;
        let backend = index.name();
        let client = Arc::new(VectorIndexClient::new(index, Arc::new(gateway)));

        let reranker: Arc<dyn Reranker> = if config.rerank.enabled {
            Arc::new(HeuristicReranker::new(config.rerank.clone())?)
        } else {
            Arc::new(NoopReranker)
        };

        let provider = create_provider(config.generation.provider_config(config.proxy.clone()))?;
        let synthesizer = AnswerSynthesizer::new(provider, config.generation.options.clone())?;

        let rag = RagService::new(chunker, client, reranker, synthesizer, config.retrieval.clone())?;

        info!(
            embedding = %config.embedding.provider,
            generation = %config.generation.provider,
            model = %config.generation.model,
            backend,
            "services initialized"
        );
        Ok(Self {
            config,
            rag: Arc::new(rag),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn rag(&self) -> Arc<RagService> {
        self.rag.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embedding::{EmbeddingProviderConfig, EmbeddingProviderType};
    use crate::services::vectorstore::VectorStoreBackend;
    use crate::utils::error::AppError;

    fn offline_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.embedding = EmbeddingProviderConfig::new(EmbeddingProviderType::Hashing);
        config.vector_store.backend = VectorStoreBackend::Hnsw;
        config.vector_store.max_elements = 1_000;
        config.generation.api_key = Some("test-key".to_string());
        config
    }

    #[tokio::test]
    async fn test_offline_config_builds() {
        let state = AppState::from_config(offline_config()).unwrap();
        assert_eq!(state.config().retrieval.top_k, 8);
        let stats = state.rag().get_stats().await.unwrap();
        assert_eq!(stats.total_vectors, 0);
        assert_eq!(stats.dimension, 256);
    }

    #[test]
    fn test_rerank_can_be_disabled() {
        let mut config = offline_config();
        config.rerank.enabled = false;
        assert!(AppState::from_config(config).is_ok());
    }

    #[test]
    fn test_missing_embedding_key_fails() {
        let mut config = offline_config();
        config.embedding = EmbeddingProviderConfig::new(EmbeddingProviderType::Gemini);
        let err = AppState::from_config(config).err().unwrap();
        assert!(matches!(err, AppError::Embedding(_)));
    }

    #[test]
    fn test_pinecone_without_host_fails() {
        let mut config = offline_config();
        config.vector_store.backend = VectorStoreBackend::Pinecone;
        config.vector_store.api_key = Some("pc-key".to_string());
        let err = AppState::from_config(config).err().unwrap();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[test]
    fn test_initialize_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "embedding": { "provider": "hashing", "model": "hashing", "dimension": 64 },
                "vector_store": { "backend": "hnsw", "max_elements": 100 },
                "generation": { "provider": "openai", "model": "gpt-4o-mini" }
            }"#,
        )
        .unwrap();
        let state = AppState::initialize(Some(&path)).unwrap();
        assert_eq!(state.config().embedding.effective_dimension(), 64);
    }
}
