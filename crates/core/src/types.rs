//! Pipeline Data Model
//!
//! Records that flow between the chunker, the vector index and the answer
//! synthesizer. Provider payloads (vector index matches in particular) are
//! converted into these types once, at the boundary, via
//! [`SearchResult::from_match`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};

/// Metadata keys used when a chunk is stored in a vector index.
pub mod metadata_keys {
    pub const TEXT: &str = "text";
    pub const SOURCE: &str = "source";
    pub const POSITION: &str = "position";
    pub const START_CHAR: &str = "startChar";
    pub const END_CHAR: &str = "endChar";
    pub const CHUNK_SIZE: &str = "chunkSize";
    pub const TIMESTAMP: &str = "timestamp";
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// Where a chunk came from and which slice of the source text it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    pub source: String,
    /// Zero-based index in chunk-creation order within the source document.
    pub position: usize,
    /// Untrimmed slice start, in characters.
    pub start_char: usize,
    /// Untrimmed slice end (exclusive), in characters.
    pub end_char: usize,
    /// Character length of the trimmed chunk text.
    pub chunk_size: usize,
}

/// A bounded, position-tagged segment of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    #[serde(flatten)]
    pub metadata: ChunkMetadata,
}

// ---------------------------------------------------------------------------
// VectorRecord
// ---------------------------------------------------------------------------

/// A chunk paired with its embedding, ready to be upserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub chunk: Chunk,
    /// RFC 3339 creation time.
    pub timestamp: String,
}

impl VectorRecord {
    /// Flatten the chunk into the metadata map stored alongside the vector.
    pub fn metadata_map(&self) -> Map<String, Value> {
        let meta = &self.chunk.metadata;
        let mut map = Map::new();
        map.insert(metadata_keys::TEXT.into(), Value::from(self.chunk.text.clone()));
        map.insert(metadata_keys::SOURCE.into(), Value::from(meta.source.clone()));
        map.insert(metadata_keys::POSITION.into(), Value::from(meta.position));
        map.insert(metadata_keys::START_CHAR.into(), Value::from(meta.start_char));
        map.insert(metadata_keys::END_CHAR.into(), Value::from(meta.end_char));
        map.insert(metadata_keys::CHUNK_SIZE.into(), Value::from(meta.chunk_size));
        map.insert(metadata_keys::TIMESTAMP.into(), Value::from(self.timestamp.clone()));
        map
    }
}

// ---------------------------------------------------------------------------
// SearchResult
// ---------------------------------------------------------------------------

/// A stored chunk returned by a similarity query.
///
/// `score` is always a similarity (higher means closer). Distance-based
/// indexes convert before constructing this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    #[serde(flatten)]
    pub chunk: Chunk,
    pub timestamp: String,
    pub score: f32,
}

impl SearchResult {
    /// Normalize a raw index match into a `SearchResult`.
    ///
    /// `text` and `source` are required. Numeric fields tolerate both integer
    /// and float encodings since some services return every number as f64.
    pub fn from_match(id: &str, score: f32, metadata: Option<&Map<String, Value>>) -> CoreResult<Self> {
        let metadata =
            metadata.ok_or_else(|| CoreError::parse(format!("match {} has no metadata", id)))?;

        let text = read_string(metadata, metadata_keys::TEXT)
            .ok_or_else(|| CoreError::parse(format!("match {} has no text metadata", id)))?;
        let source = read_string(metadata, metadata_keys::SOURCE)
            .ok_or_else(|| CoreError::parse(format!("match {} has no source metadata", id)))?;

        let chunk_size = match metadata.get(metadata_keys::CHUNK_SIZE) {
            Some(_) => read_usize(metadata, metadata_keys::CHUNK_SIZE, id)?,
            None => text.chars().count(),
        };

        Ok(Self {
            id: id.to_string(),
            chunk: Chunk {
                metadata: ChunkMetadata {
                    source,
                    position: read_usize(metadata, metadata_keys::POSITION, id)?,
                    start_char: read_usize(metadata, metadata_keys::START_CHAR, id)?,
                    end_char: read_usize(metadata, metadata_keys::END_CHAR, id)?,
                    chunk_size,
                },
                text,
            },
            timestamp: read_string(metadata, metadata_keys::TIMESTAMP).unwrap_or_default(),
            score,
        })
    }

    pub fn text(&self) -> &str {
        &self.chunk.text
    }

    pub fn position(&self) -> usize {
        self.chunk.metadata.position
    }
}

fn read_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Missing numeric fields read as 0; present but non-numeric ones are errors.
fn read_usize(map: &Map<String, Value>, key: &str, id: &str) -> CoreResult<usize> {
    let Some(value) = map.get(key) else {
        return Ok(0);
    };
    if let Some(n) = value.as_u64() {
        return Ok(n as usize);
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 => Ok(f as usize),
        _ => Err(CoreError::parse(format!(
            "match {} has invalid {} metadata: {}",
            id, key, value
        ))),
    }
}

// ---------------------------------------------------------------------------
// RerankedResult / Citation
// ---------------------------------------------------------------------------

/// A search result after the rerank pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankedResult {
    #[serde(flatten)]
    pub result: SearchResult,
    pub rerank_score: f32,
    /// Copy of the pre-rerank similarity.
    pub original_score: f32,
}

/// A reference from a generated answer back to one context chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub source: String,
    pub position: usize,
    /// Preview of the chunk text, cut to a fixed character budget plus `...`.
    pub text: String,
    pub relevance_score: f32,
}

impl Citation {
    pub fn from_reranked(item: &RerankedResult, preview_chars: usize) -> Self {
        let preview: String = item.result.text().chars().take(preview_chars).collect();
        Self {
            source: item.result.chunk.metadata.source.clone(),
            position: item.result.position(),
            text: format!("{}...", preview),
            relevance_score: item.rerank_score,
        }
    }
}
