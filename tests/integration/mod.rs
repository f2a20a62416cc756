//! Integration Tests Module
//!
//! End-to-end tests over the public crate API. Everything runs offline: the
//! hashing embedder, the in-process HNSW index and a scripted model provider
//! stand in for the remote services.

// Shared test harness
mod common;

// Chunking properties over realistic documents
mod chunking_test;

// Index -> query flow through RagService
mod pipeline_test;

// Reranking against real retrieval scores
mod reranker_test;

// File extraction feeding the index flow
mod extraction_test;

// Command handlers and configuration wiring
mod commands_test;
