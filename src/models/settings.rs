//! Settings Models
//!
//! Application configuration stored in config.json.

use serde::{Deserialize, Serialize};

use citerag_core::ProxyConfig;
use citerag_llm::{GenerationOptions, ProviderConfig, ProviderType};

use crate::services::embedding::{EmbeddingProviderConfig, EmbeddingProviderType};
use crate::services::knowledge::{ChunkingConfig, RerankConfig, RetrievalConfig};
use crate::services::vectorstore::VectorStoreConfig;
use crate::utils::error::{AppError, AppResult};

/// Environment variables that carry secrets and deployment specifics.
pub mod env_keys {
    pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
    pub const PINECONE_INDEX_HOST: &str = "PINECONE_INDEX_HOST";
}

/// Generative model selection plus decoding parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: ProviderType,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_url: Option<String>,
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

fn default_generation_provider() -> ProviderType {
    ProviderType::Gemini
}

fn default_generation_model() -> String {
    ProviderConfig::default().model
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            base_url: None,
            api_key: None,
            options: GenerationOptions::default(),
        }
    }
}

impl GenerationConfig {
    pub fn provider_config(&self, proxy: Option<ProxyConfig>) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider,
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            proxy,
        }
    }
}

/// Application configuration stored in config.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub rerank: RerankConfig,
    #[serde(default)]
    pub embedding: EmbeddingProviderConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    /// Applied to every outbound client that has no proxy of its own.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub proxy: Option<ProxyConfig>,
}

impl AppConfig {
    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        self.chunking.validate()?;
        self.retrieval.validate()?;
        self.rerank.validate()?;
        self.embedding
            .validate()
            .map_err(|e| AppError::config(format!("embedding: {}", e)))?;
        self.generation
            .options
            .validate()
            .map_err(|e| AppError::config(format!("generation: {}", e)))?;
        if self.generation.model.trim().is_empty() {
            return Err(AppError::config("generation: model name must not be empty"));
        }
        self.vector_store
            .validate()
            .map_err(|e| AppError::config(format!("vector_store: {}", e)))?;
        Ok(())
    }

    /// Fill API keys and the Pinecone host from `lookup`.
    ///
    /// Values already present are overwritten; keys are only routed to the
    /// sections whose provider uses them.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let embedding_key = match self.embedding.provider {
            EmbeddingProviderType::Gemini => get(env_keys::GOOGLE_API_KEY),
            EmbeddingProviderType::OpenAI => get(env_keys::OPENAI_API_KEY),
            EmbeddingProviderType::Hashing => None,
        };
        if embedding_key.is_some() {
            self.embedding.api_key = embedding_key;
        }

        let generation_key = match self.generation.provider {
            ProviderType::Gemini => get(env_keys::GOOGLE_API_KEY),
            ProviderType::OpenAI => get(env_keys::OPENAI_API_KEY),
        };
        if generation_key.is_some() {
            self.generation.api_key = generation_key;
        }

        if let Some(key) = get(env_keys::PINECONE_API_KEY) {
            self.vector_store.api_key = Some(key);
        }
        if let Some(host) = get(env_keys::PINECONE_INDEX_HOST) {
            self.vector_store.index_host = Some(host);
        }
    }

    /// Copy the shared proxy into sections without their own.
    pub fn apply_shared_proxy(&mut self) {
        if let Some(proxy) = &self.proxy {
            if self.embedding.proxy.is_none() {
                self.embedding.proxy = Some(proxy.clone());
            }
            if self.vector_store.proxy.is_none() {
                self.vector_store.proxy = Some(proxy.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vectorstore::VectorStoreBackend;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chunking.chunk_size, 3200);
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.retrieval.rerank_top_k, 3);
        assert_eq!(config.embedding.provider, EmbeddingProviderType::Gemini);
        assert_eq!(config.embedding.effective_dimension(), 768);
        assert_eq!(config.generation.model, "gemini-2.0-flash-exp");
        assert_eq!(config.vector_store.backend, VectorStoreBackend::Pinecone);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "chunking": { "chunk_size": 1000 },
                "vector_store": { "backend": "hnsw" },
                "generation": { "provider": "openai", "model": "gpt-4o-mini", "temperature": 0.0 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert!((config.chunking.overlap - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.vector_store.backend, VectorStoreBackend::Hnsw);
        assert_eq!(config.vector_store.max_elements, 100_000);
        assert_eq!(config.generation.provider, ProviderType::OpenAI);
        assert_eq!(config.generation.options.temperature, 0.0);
        assert_eq!(config.generation.options.max_output_tokens, 1024);
        assert!((config.rerank.similarity_weight - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_validate_rejects_bad_sections() {
        let mut config = AppConfig::default();
        config.chunking.overlap = 1.0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rerank.term_frequency_weight = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.embedding.dimension = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("embedding"));

        let mut config = AppConfig::default();
        config.generation.options.top_p = 1.5;
        assert!(config.validate().unwrap_err().to_string().contains("generation"));
    }

    #[test]
    fn test_env_overlay_routes_keys() {
        let env: HashMap<&str, &str> = [
            (env_keys::GOOGLE_API_KEY, "g-key"),
            (env_keys::OPENAI_API_KEY, "o-key"),
            (env_keys::PINECONE_API_KEY, "p-key"),
            (env_keys::PINECONE_INDEX_HOST, "idx.svc.pinecone.io"),
        ]
        .into_iter()
        .collect();
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let mut config = AppConfig::default();
        config.generation.provider = ProviderType::OpenAI;
        config.apply_env(lookup);

        assert_eq!(config.embedding.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.generation.api_key.as_deref(), Some("o-key"));
        assert_eq!(config.vector_store.api_key.as_deref(), Some("p-key"));
        assert_eq!(config.vector_store.index_host.as_deref(), Some("idx.svc.pinecone.io"));
    }

    #[test]
    fn test_env_overlay_ignores_blank_values() {
        let mut config = AppConfig::default();
        config.embedding.api_key = Some("from-file".to_string());
        config.apply_env(|_| Some("  ".to_string()));
        assert_eq!(config.embedding.api_key.as_deref(), Some("from-file"));
        assert!(config.vector_store.index_host.is_none());
    }

    #[test]
    fn test_secrets_not_serialized() {
        let mut config = AppConfig::default();
        config.apply_env(|k| (k != env_keys::PINECONE_INDEX_HOST).then(|| "secret".to_string()));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn test_shared_proxy_fills_gaps() {
        let mut config = AppConfig {
            proxy: Some(ProxyConfig {
                protocol: citerag_core::ProxyProtocol::Socks5,
                host: "127.0.0.1".to_string(),
                port: 1080,
                username: None,
                password: None,
            }),
            ..Default::default()
        };
        config.apply_shared_proxy();
        assert_eq!(config.embedding.proxy.as_ref().map(|p| p.port), Some(1080));
        assert_eq!(config.vector_store.proxy.as_ref().map(|p| p.port), Some(1080));
    }
}
