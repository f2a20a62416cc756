//! Error Handling
//!
//! Unified error types for the application.

use thiserror::Error;

use citerag_core::CoreError;
use citerag_llm::LlmError;

use crate::services::embedding::EmbeddingError;
use crate::services::vectorstore::StoreError;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid chunking, retrieval or provider settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Nothing usable to index
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// An extracted document has too little text
    #[error("Empty content: {0}")]
    EmptyContent(String),

    /// The extractor does not handle this MIME type
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A document could not be parsed
    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Generation error: {0}")]
    Generation(#[from] LlmError),

    /// Provider payload could not be normalized
    #[error(transparent)]
    Core(#[from] CoreError),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an empty input error
    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    /// Create an empty content error
    pub fn empty_content(msg: impl Into<String>) -> Self {
        Self::EmptyContent(msg.into())
    }

    /// Create an unsupported format error
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Create an extraction error
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convert AppError to a string for display at the CLI edge
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
