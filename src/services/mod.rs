//! Services
//!
//! Business logic: the RAG pipeline and the collaborators it is wired to.

pub mod embedding;
pub mod extract;
pub mod knowledge;
pub mod vectorstore;
