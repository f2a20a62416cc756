//! Embedding
//!
//! Provider abstraction, concrete providers and the batching gateway.

pub mod gateway;
pub mod gemini;
pub mod hashing;
pub mod openai;
pub mod provider;

pub use gateway::EmbeddingGateway;
pub use hashing::HashingEmbeddingProvider;
pub use provider::{
    EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig, EmbeddingProviderType,
    EmbeddingResult,
};
