//! Chunking over realistic documents.

use citerag::services::knowledge::chunker::{
    chunking_stats, estimate_tokens, Chunker, ChunkingConfig, ChunkingStats, SlidingWindowChunker,
};

use super::common::long_document;

#[test]
fn default_config_splits_3600_chars_into_two_windows() {
    let text: String = long_document(3600).chars().take(3600).collect();
    assert_eq!(text.chars().count(), 3600);

    let chunks = SlidingWindowChunker::new(ChunkingConfig::default())
        .unwrap()
        .chunk(&text, "earth.txt")
        .unwrap();

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].metadata.start_char, 0);
    assert_eq!(chunks[0].metadata.end_char, 3200);
    assert_eq!(chunks[1].metadata.start_char, 2720);
    assert_eq!(chunks[1].metadata.end_char, 3600);
    assert_eq!(chunks[1].metadata.position, 1);
    assert!(chunks.iter().all(|c| c.metadata.source == "earth.txt"));
}

#[test]
fn consecutive_windows_share_overlap() {
    let text = long_document(20_000);
    for (chunk_size, overlap) in [(3200, 0.15), (1000, 0.25), (512, 0.0), (777, 0.5)] {
        let config = ChunkingConfig { chunk_size, overlap };
        let overlap_size = config.overlap_size();
        let chunks = SlidingWindowChunker::new(config).unwrap().chunk(&text, "doc").unwrap();
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let shared = pair[0].metadata.end_char.saturating_sub(pair[1].metadata.start_char);
            assert_eq!(shared, overlap_size, "chunk_size {} overlap {}", chunk_size, overlap);
        }
    }
}

#[test]
fn chunk_metadata_is_consistent() {
    let text = long_document(10_000);
    let chunks = SlidingWindowChunker::new(ChunkingConfig {
        chunk_size: 900,
        overlap: 0.1,
    })
    .unwrap()
    .chunk(&text, "doc")
    .unwrap();

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.metadata.position, i);
        assert!(chunk.metadata.start_char < chunk.metadata.end_char);
        assert_eq!(chunk.metadata.chunk_size, chunk.text.chars().count());
        assert_eq!(chunk.text, chunk.text.trim());
    }
    assert_eq!(
        chunks.last().map(|c| c.metadata.end_char),
        Some(text.chars().count())
    );
}

#[test]
fn stats_summarize_chunks() {
    let text = long_document(8_000);
    let chunks = SlidingWindowChunker::new(ChunkingConfig {
        chunk_size: 2000,
        overlap: 0.15,
    })
    .unwrap()
    .chunk(&text, "doc")
    .unwrap();

    match chunking_stats(&chunks) {
        ChunkingStats::Summary(summary) => {
            assert_eq!(summary.total_chunks, chunks.len());
            assert!(summary.max_chunk_size <= 2000);
            assert!(summary.min_chunk_size <= summary.avg_chunk_size);
            assert!(summary.avg_chunk_size <= summary.max_chunk_size);
            let total: usize = chunks.iter().map(|c| estimate_tokens(&c.text)).sum();
            assert_eq!(summary.total_tokens, total);
        }
        ChunkingStats::NoChunks => panic!("expected a summary"),
    }
    assert_eq!(chunking_stats(&[]), ChunkingStats::NoChunks);
}
