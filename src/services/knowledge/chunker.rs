//! Document Chunker
//!
//! Defines the `Chunker` trait and the sliding-window implementation used for
//! indexing, plus the token estimate and per-document chunk statistics.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let chunker = SlidingWindowChunker::new(ChunkingConfig::default())?;
//! let chunks = chunker.chunk(&text, "handbook.pdf")?;
//! ```

use serde::{Deserialize, Serialize};

use citerag_core::{Chunk, ChunkMetadata};

use crate::utils::error::{AppError, AppResult};

/// Trimmed windows shorter than this end chunking.
pub const MIN_CHUNK_CHARS: usize = 50;

/// Characters per token used by [`estimate_tokens`].
pub const CHARS_PER_TOKEN: f64 = 3.5;

/// Heuristic token count: `ceil(chars / 3.5)`.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() as f64 / CHARS_PER_TOKEN).ceil() as usize
}

// ---------------------------------------------------------------------------
// Chunker trait
// ---------------------------------------------------------------------------

/// Trait for document chunking strategies.
pub trait Chunker: Send + Sync {
    /// Split `text` into ordered, position-tagged chunks attributed to `source`.
    fn chunk(&self, text: &str, source: &str) -> AppResult<Vec<Chunk>>;
}

// ---------------------------------------------------------------------------
// ChunkingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window length in characters (~800 tokens by default).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Fraction of each window repeated at the start of the next, in `[0, 1)`.
    #[serde(default = "default_overlap")]
    pub overlap: f64,
}

fn default_chunk_size() -> usize {
    3200
}

fn default_overlap() -> f64 {
    0.15
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

impl ChunkingConfig {
    /// Characters shared by consecutive windows: `floor(chunk_size * overlap)`.
    pub fn overlap_size(&self) -> usize {
        (self.chunk_size as f64 * self.overlap).floor() as usize
    }

    /// Distance between consecutive window starts.
    pub fn step(&self) -> AppResult<usize> {
        self.validate()?;
        Ok(self.chunk_size - self.overlap_size())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::config("chunk_size must be greater than 0"));
        }
        if !self.overlap.is_finite() || self.overlap < 0.0 || self.overlap >= 1.0 {
            return Err(AppError::config(format!(
                "overlap must be within [0, 1), got {}",
                self.overlap
            )));
        }
        if self.overlap_size() >= self.chunk_size {
            return Err(AppError::config(format!(
                "overlap {} leaves no forward step for chunk_size {}",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SlidingWindowChunker
// ---------------------------------------------------------------------------

/// Fixed-width character windows advancing by `chunk_size - overlap_size`.
///
/// Each window is trimmed before it is emitted; `start_char`/`end_char`
/// record the untrimmed window bounds. Chunking stops at the first window
/// whose trimmed text is shorter than [`MIN_CHUNK_CHARS`] (not emitted), or
/// after emitting the window that reaches the end of the text.
#[derive(Debug, Clone)]
pub struct SlidingWindowChunker {
    config: ChunkingConfig,
}

impl SlidingWindowChunker {
    pub fn new(config: ChunkingConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }
}

impl Chunker for SlidingWindowChunker {
    fn chunk(&self, text: &str, source: &str) -> AppResult<Vec<Chunk>> {
        let step = self.config.step()?;
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut chunks = Vec::new();
        let mut offset = 0;

        while offset < len {
            let end = (offset + self.config.chunk_size).min(len);
            let window: String = chars[offset..end].iter().collect();
            let trimmed = window.trim();
            let trimmed_len = trimmed.chars().count();

            if trimmed_len < MIN_CHUNK_CHARS {
                break;
            }

            chunks.push(Chunk {
                text: trimmed.to_string(),
                metadata: ChunkMetadata {
                    source: source.to_string(),
                    position: chunks.len(),
                    start_char: offset,
                    end_char: end,
                    chunk_size: trimmed_len,
                },
            });

            if end >= len {
                break;
            }
            offset += step;
        }

        Ok(chunks)
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Aggregate figures for one chunked document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkSummary {
    pub total_chunks: usize,
    pub avg_chunk_size: usize,
    pub avg_tokens: usize,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
    pub total_tokens: usize,
}

/// Result of [`chunking_stats`]: either a summary or nothing to index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkingStats {
    Summary(ChunkSummary),
    NoChunks,
}

pub fn chunking_stats(chunks: &[Chunk]) -> ChunkingStats {
    if chunks.is_empty() {
        return ChunkingStats::NoChunks;
    }

    let sizes: Vec<usize> = chunks.iter().map(|c| c.text.chars().count()).collect();
    let total_size: usize = sizes.iter().sum();
    let total_tokens: usize = chunks.iter().map(|c| estimate_tokens(&c.text)).sum();
    let n = chunks.len() as f64;

    ChunkingStats::Summary(ChunkSummary {
        total_chunks: chunks.len(),
        avg_chunk_size: (total_size as f64 / n).round() as usize,
        avg_tokens: (total_tokens as f64 / n).round() as usize,
        min_chunk_size: sizes.iter().copied().min().unwrap_or(0),
        max_chunk_size: sizes.iter().copied().max().unwrap_or(0),
        total_tokens,
    })
}
