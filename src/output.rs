//! Output formatting for command results.
//!
//! Human-readable terminal text, or the `CommandResponse` envelope as JSON.

use serde::Serialize;

use citerag::services::knowledge::{DocumentStats, QueryOutcome};
use citerag::services::vectorstore::IndexStats;
use citerag::CommandResponse;

pub fn format_json<T: Serialize>(response: &CommandResponse<T>) -> String {
    serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_index(stats: &DocumentStats) -> String {
    format!(
        "Indexed {} chunk{} ({} vectors stored) in {} ms\n  avg chunk: {} chars, ~{} tokens\n  total: ~{} tokens",
        stats.chunks_created,
        if stats.chunks_created == 1 { "" } else { "s" },
        stats.vectors_stored,
        stats.processing_time_ms,
        stats.avg_chunk_size,
        stats.avg_tokens,
        stats.total_tokens
    )
}

pub fn format_query(outcome: &QueryOutcome) -> String {
    let response = outcome.response();
    let mut output = String::new();
    output.push_str(&response.answer);
    output.push('\n');

    if !response.citations.is_empty() {
        output.push_str("\nSources:\n");
        for (i, citation) in response.citations.iter().enumerate() {
            output.push_str(&format!(
                "  [{}] {} #{} (relevance {:.2})\n      {}\n",
                i + 1,
                citation.source,
                citation.position,
                citation.relevance_score,
                citation.text.replace('\n', " ")
            ));
        }
    }

    let meta = &response.metadata;
    output.push_str(&format!(
        "\n{} of {} retrieved chunks used, {} indexed, ~{} tokens, model {}, {} ms",
        meta.reranked_chunks,
        meta.retrieved_chunks,
        meta.total_chunks,
        meta.tokens_used,
        meta.model,
        meta.processing_time_ms
    ));
    output
}

pub fn format_stats(stats: &IndexStats) -> String {
    format!(
        "{} vectors, dimension {}, {:.1}% full",
        stats.total_vectors,
        stats.dimension,
        stats.index_fullness * 100.0
    )
}
