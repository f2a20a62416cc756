//! Embedding Gateway
//!
//! Uniform entry point to whichever `EmbeddingProvider` is configured.
//! Batch embedding fans out independent single-text calls with a bounded
//! number in flight; results come back in input order and the first failure
//! fails the whole batch.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use super::gemini::GeminiEmbeddingProvider;
use super::hashing::HashingEmbeddingProvider;
use super::openai::OpenAIEmbeddingProvider;
use super::provider::{
    EmbeddingProvider, EmbeddingProviderConfig, EmbeddingProviderType, EmbeddingResult,
};

pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
    max_concurrency: usize,
}

impl EmbeddingGateway {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, max_concurrency: usize) -> Self {
        Self {
            provider,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Build the configured provider and wrap it.
    pub fn from_config(config: &EmbeddingProviderConfig) -> EmbeddingResult<Self> {
        config.validate()?;
        let provider: Arc<dyn EmbeddingProvider> = match config.provider {
            EmbeddingProviderType::Gemini => Arc::new(GeminiEmbeddingProvider::new(config)?),
            EmbeddingProviderType::OpenAI => Arc::new(OpenAIEmbeddingProvider::new(config)?),
            EmbeddingProviderType::Hashing => Arc::new(HashingEmbeddingProvider::from_config(config)?),
        };
        Ok(Self::new(provider, config.max_concurrency))
    }

    pub async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.provider.embed(text).await
    }

    /// Embed every text, preserving input order.
    pub async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        debug!(
            count = texts.len(),
            provider = self.provider.display_name(),
            concurrency = self.max_concurrency,
            "embedding batch"
        );

        stream::iter(texts.iter().enumerate())
            .map(|(index, text)| async move {
                self.provider.embed(text).await.map_err(|e| {
                    warn!(index, error = %e, "embedding failed, aborting batch");
                    e
                })
            })
            .buffered(self.max_concurrency)
            .try_collect()
            .await
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }
}
