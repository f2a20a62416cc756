//! Knowledge System
//!
//! The RAG (Retrieval-Augmented Generation) pipeline components:
//! - `chunker`: sliding-window document chunking and chunk statistics
//! - `retriever`: nearest-neighbour candidate lookup
//! - `reranker`: lexical and positional rescoring
//! - `synthesizer`: grounded prompt assembly and cited answers
//! - `pipeline`: `RagService` sequencing the index and query flows

pub mod chunker;
pub mod pipeline;
pub mod reranker;
pub mod retriever;
pub mod synthesizer;

pub use chunker::{Chunker, ChunkingConfig, ChunkingStats, SlidingWindowChunker};
pub use pipeline::{DocumentStats, QueryMetadata, QueryOutcome, QueryResponse, RagService, RetrievalConfig};
pub use reranker::{HeuristicReranker, NoopReranker, RerankConfig, Reranker};
pub use retriever::Retriever;
pub use synthesizer::{AnswerSynthesizer, SynthesizedAnswer};
