//! CiteRAG Core
//!
//! Foundational data model and error types for the CiteRAG workspace. This crate
//! has zero dependencies on application-level code (embedding providers, vector
//! index services, LLM providers, etc.).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `types` - Chunk, search and citation records shared by every pipeline stage
//! - `proxy` - Proxy configuration data types shared across workspace crates
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/thiserror** - keeps build times minimal
//! 2. **Normalize at the boundary** - provider payloads are converted into `types` once
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod proxy;
pub mod types;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};

// ── Data Model ─────────────────────────────────────────────────────────
pub use types::{Chunk, ChunkMetadata, Citation, RerankedResult, SearchResult, VectorRecord};
