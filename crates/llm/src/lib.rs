//! CiteRAG LLM
//!
//! Provides a unified text generation interface over generative model providers:
//! - Google Gemini (`generateContent`)
//! - OpenAI and OpenAI-compatible chat completion endpoints
//!
//! Also includes the HTTP client factory shared with the embedding providers and
//! the remote vector index client.

pub mod gemini;
pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use gemini::GeminiProvider;
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::{create_provider, LlmProvider};
pub use types::*;
