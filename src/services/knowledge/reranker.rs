//! Reranker
//!
//! Defines the `Reranker` trait and implementations for rescoring retrieved
//! chunks before they are handed to the answer synthesizer.
//!
//! - `NoopReranker`: keeps vector similarity as the final score
//! - `HeuristicReranker`: blends vector similarity, query keyword overlap and
//!   a prior favoring chunks near the start of their document

use std::cmp::Ordering;
use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use citerag_core::{RerankedResult, SearchResult};

use crate::utils::error::{AppError, AppResult};

/// Number of results kept when the caller does not ask for a specific count.
pub const DEFAULT_RERANK_TOP_K: usize = 3;

/// Function words and pronouns ignored by keyword overlap.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will", "would",
    "could", "should", "may", "might", "must", "can", "this", "that", "these", "those", "i", "you",
    "he", "she", "it", "we", "they", "me", "him", "her", "us", "them",
];

/// Trait for reranking search results.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rescore `candidates` for `query` and return the best `top_k`, highest
    /// `rerank_score` first. Equal scores keep their input order.
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<SearchResult>,
        top_k: usize,
    ) -> AppResult<Vec<RerankedResult>>;
}

/// Stable descending sort on `rerank_score`, then truncate.
fn sort_and_truncate(mut results: Vec<RerankedResult>, top_k: usize) -> Vec<RerankedResult> {
    results.sort_by(|a, b| {
        b.rerank_score
            .partial_cmp(&a.rerank_score)
            .unwrap_or(Ordering::Equal)
    });
    results.truncate(top_k);
    results
}

// ---------------------------------------------------------------------------
// NoopReranker
// ---------------------------------------------------------------------------

/// Pass-through reranker: the final score is the vector similarity.
pub struct NoopReranker;

#[async_trait]
impl Reranker for NoopReranker {
    async fn rerank(
        &self,
        _query: &str,
        candidates: Vec<SearchResult>,
        top_k: usize,
    ) -> AppResult<Vec<RerankedResult>> {
        let results = candidates
            .into_iter()
            .map(|result| RerankedResult {
                rerank_score: result.score,
                original_score: result.score,
                result,
            })
            .collect();
        Ok(sort_and_truncate(results, top_k))
    }
}

// ---------------------------------------------------------------------------
// HeuristicReranker
// ---------------------------------------------------------------------------

/// Weights and position prior for [`HeuristicReranker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankConfig {
    /// Use `HeuristicReranker`; when false the pipeline keeps vector order.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f32,
    #[serde(default = "default_term_frequency_weight")]
    pub term_frequency_weight: f32,
    #[serde(default = "default_position_weight")]
    pub position_weight: f32,
    /// Boost lost per position step.
    #[serde(default = "default_position_decay")]
    pub position_decay: f32,
    /// Lowest position boost any chunk can receive.
    #[serde(default = "default_position_floor")]
    pub position_floor: f32,
}

fn default_enabled() -> bool {
    true
}

fn default_similarity_weight() -> f32 {
    0.7
}

fn default_term_frequency_weight() -> f32 {
    0.2
}

fn default_position_weight() -> f32 {
    0.1
}

fn default_position_decay() -> f32 {
    0.1
}

fn default_position_floor() -> f32 {
    0.1
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            similarity_weight: default_similarity_weight(),
            term_frequency_weight: default_term_frequency_weight(),
            position_weight: default_position_weight(),
            position_decay: default_position_decay(),
            position_floor: default_position_floor(),
        }
    }
}

impl RerankConfig {
    pub fn validate(&self) -> AppResult<()> {
        let fields = [
            ("similarity_weight", self.similarity_weight),
            ("term_frequency_weight", self.term_frequency_weight),
            ("position_weight", self.position_weight),
            ("position_decay", self.position_decay),
            ("position_floor", self.position_floor),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::config(format!(
                    "rerank.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

pub struct HeuristicReranker {
    config: RerankConfig,
}

impl HeuristicReranker {
    pub fn new(config: RerankConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// `max(floor, 1 - position * decay)`
    pub fn position_boost(&self, position: usize) -> f32 {
        (1.0 - position as f32 * self.config.position_decay).max(self.config.position_floor)
    }

    /// Fraction of distinct query keywords present in the chunk.
    pub fn term_frequency_score(query_terms: &[String], chunk_text: &str) -> f32 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let chunk_terms: HashSet<String> = tokenize(chunk_text).into_iter().collect();
        let matched = query_terms.iter().filter(|t| chunk_terms.contains(*t)).count();
        matched as f32 / query_terms.len() as f32
    }

    fn score(&self, query_terms: &[String], result: &SearchResult) -> f32 {
        let tf = Self::term_frequency_score(query_terms, result.text());
        let pos = self.position_boost(result.position());
        self.config.similarity_weight * result.score
            + self.config.term_frequency_weight * tf
            + self.config.position_weight * pos
    }
}

impl Default for HeuristicReranker {
    fn default() -> Self {
        Self {
            config: RerankConfig::default(),
        }
    }
}

#[async_trait]
impl Reranker for HeuristicReranker {
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<SearchResult>,
        top_k: usize,
    ) -> AppResult<Vec<RerankedResult>> {
        let query_terms = distinct(tokenize(query));
        let candidate_count = candidates.len();

        let scored = candidates
            .into_iter()
            .map(|result| RerankedResult {
                rerank_score: self.score(&query_terms, &result),
                original_score: result.score,
                result,
            })
            .collect();
        let results = sort_and_truncate(scored, top_k);

        debug!(
            query_terms = query_terms.len(),
            candidates = candidate_count,
            kept = results.len(),
            "reranked candidates"
        );
        Ok(results)
    }
}

/// Lowercase keyword tokens: punctuation becomes whitespace, tokens of two
/// characters or fewer and stop words are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() > 2 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

fn distinct(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use citerag_core::{Chunk, ChunkMetadata};

    fn result(id: &str, text: &str, position: usize, score: f32) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            chunk: Chunk {
                text: text.to_string(),
                metadata: ChunkMetadata {
                    source: "doc.txt".to_string(),
                    position,
                    start_char: 0,
                    end_char: text.len(),
                    chunk_size: text.len(),
                },
            },
            timestamp: String::new(),
            score,
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    // ======================================================================
    // tokenize
    // ======================================================================

    #[test]
    fn test_tokenize_strips_punctuation_and_stop_words() {
        assert_eq!(
            tokenize("What is the capital of France?"),
            vec!["what", "capital", "france"]
        );
        assert_eq!(
            tokenize("Rust's borrow-checker, explained!"),
            vec!["rust", "borrow", "checker", "explained"]
        );
    }

    #[test]
    fn test_tokenize_drops_short_tokens() {
        assert!(tokenize("an ox is at it, ok?").is_empty());
    }

    #[test]
    fn test_tokenize_keeps_non_ascii_words() {
        assert_eq!(tokenize("Café crème brûlée"), vec!["café", "crème", "brûlée"]);
    }

    // ======================================================================
    // scoring components
    // ======================================================================

    #[test]
    fn test_position_boost_floors() {
        let reranker = HeuristicReranker::default();
        assert!(approx(reranker.position_boost(0), 1.0));
        assert!(approx(reranker.position_boost(3), 0.7));
        assert!(approx(reranker.position_boost(9), 0.1));
        for position in [10, 15, 100, 10_000] {
            assert!(approx(reranker.position_boost(position), 0.1));
        }
    }

    #[test]
    fn test_term_frequency_score() {
        let terms = distinct(tokenize("capital France population"));
        let tf = HeuristicReranker::term_frequency_score(&terms, "Paris is the capital of France.");
        assert!(approx(tf, 2.0 / 3.0));
        assert!(approx(HeuristicReranker::term_frequency_score(&[], "anything"), 0.0));
    }

    #[test]
    fn test_repeated_query_words_count_once() {
        let terms = distinct(tokenize("france france france capital"));
        assert_eq!(terms.len(), 2);
        let tf = HeuristicReranker::term_frequency_score(&terms, "France is in Europe.");
        assert!(approx(tf, 0.5));
    }

    // ======================================================================
    // rerank
    // ======================================================================

    #[tokio::test]
    async fn test_blended_score() {
        let reranker = HeuristicReranker::default();
        let out = reranker
            .rerank(
                "capital France",
                vec![result("a", "Paris is the capital of France.", 2, 0.8)],
                3,
            )
            .await
            .unwrap();
        // 0.7*0.8 + 0.2*1.0 + 0.1*0.8
        assert!(approx(out[0].rerank_score, 0.84));
        assert!(approx(out[0].original_score, 0.8));
    }

    #[tokio::test]
    async fn test_stop_word_query_reduces_to_similarity_and_position() {
        let reranker = HeuristicReranker::default();
        let candidates = vec![
            result("a", "The capital city sits on the river.", 0, 0.9),
            result("b", "Another unrelated passage about rivers.", 12, 0.4),
        ];
        let out = reranker.rerank("is it the one?", candidates, 5).await.unwrap();
        for r in &out {
            let expected = 0.7 * r.original_score + 0.1 * reranker.position_boost(r.result.position());
            assert!(approx(r.rerank_score, expected));
        }
    }

    #[tokio::test]
    async fn test_output_sorted_and_truncated() {
        let reranker = HeuristicReranker::default();
        let candidates: Vec<SearchResult> = (0..8)
            .map(|i| result(&format!("c{}", i), "some neutral chunk text", i, 0.1 * i as f32))
            .collect();

        for top_k in [0, 1, 3, 8, 20] {
            let out = reranker.rerank("neutral", candidates.clone(), top_k).await.unwrap();
            assert_eq!(out.len(), top_k.min(candidates.len()));
            assert!(out.windows(2).all(|w| w[0].rerank_score >= w[1].rerank_score));
        }
    }

    #[tokio::test]
    async fn test_ties_keep_input_order() {
        let reranker = HeuristicReranker::default();
        let candidates = vec![
            result("first", "identical text here", 0, 0.5),
            result("second", "identical text here", 0, 0.5),
            result("third", "identical text here", 0, 0.5),
        ];
        let out = reranker.rerank("identical", candidates, 3).await.unwrap();
        let ids: Vec<&str> = out.iter().map(|r| r.result.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_keyword_match_beats_slightly_closer_vector() {
        let reranker = HeuristicReranker::default();
        let candidates = vec![
            result("semantic", "Lyon is a large city in the south east.", 0, 0.62),
            result("exact", "Paris is the capital of France.", 0, 0.58),
        ];
        let out = reranker
            .rerank("What is the capital of France?", candidates, 2)
            .await
            .unwrap();
        assert_eq!(out[0].result.id, "exact");
    }

    #[tokio::test]
    async fn test_custom_weights() {
        let reranker = HeuristicReranker::new(RerankConfig {
            similarity_weight: 1.0,
            term_frequency_weight: 0.0,
            position_weight: 0.0,
            ..Default::default()
        })
        .unwrap();
        let out = reranker
            .rerank("q", vec![result("a", "text", 5, 0.42)], 1)
            .await
            .unwrap();
        assert!(approx(out[0].rerank_score, 0.42));
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let err = HeuristicReranker::new(RerankConfig {
            position_weight: -0.1,
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_noop_reranker_keeps_similarity() {
        let out = NoopReranker
            .rerank(
                "anything",
                vec![result("low", "x", 0, 0.2), result("high", "y", 9, 0.9)],
                1,
            )
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].result.id, "high");
        assert!(approx(out[0].rerank_score, 0.9));
    }
}
