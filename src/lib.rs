//! citerag - Retrieval-Augmented Question Answering
//!
//! Index documents into a vector store and answer questions from them with
//! cited sources. It includes:
//! - Command handlers for the CLI
//! - The RAG pipeline and its embedding, vector store and generation services
//! - JSON configuration storage
//! - Data models and utilities

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use commands::{clear_index, get_index_stats, index_document, query_knowledge};
pub use models::response::CommandResponse;
pub use models::settings::AppConfig;
pub use services::knowledge::{DocumentStats, QueryOutcome, QueryResponse, RagService};
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
