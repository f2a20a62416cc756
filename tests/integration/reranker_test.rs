//! Reranking against real retrieval output.

use citerag::services::knowledge::reranker::{HeuristicReranker, RerankConfig, Reranker};
use citerag::services::knowledge::ChunkingConfig;

use super::common::{harness, long_document};

#[tokio::test]
async fn rerank_keeps_order_invariants_on_retrieved_candidates() {
    let h = harness(ChunkingConfig {
        chunk_size: 300,
        overlap: 0.1,
    });
    h.service
        .index(&long_document(4_000), "earth.txt", true)
        .await
        .unwrap();

    let candidates = h.client.search("coral reefs marine life", 8).await.unwrap();
    assert_eq!(candidates.len(), 8);

    let reranker = HeuristicReranker::default();
    for top_k in [1, 3, 8, 12] {
        let out = reranker
            .rerank("coral reefs marine life", candidates.clone(), top_k)
            .await
            .unwrap();
        assert_eq!(out.len(), top_k.min(candidates.len()));
        assert!(out.windows(2).all(|w| w[0].rerank_score >= w[1].rerank_score));
        for r in &out {
            let boost = reranker.position_boost(r.result.position());
            assert!(boost >= 0.1);
            assert!(r.rerank_score >= 0.7 * r.original_score + 0.1 * boost - 1e-5);
        }
    }
}

#[tokio::test]
async fn stop_word_only_query_ignores_keywords() {
    let h = harness(ChunkingConfig {
        chunk_size: 300,
        overlap: 0.0,
    });
    h.service
        .index(&long_document(2_000), "earth.txt", true)
        .await
        .unwrap();

    let question = "is it this or that?";
    let candidates = h.client.search(question, 5).await.unwrap();
    let out = HeuristicReranker::default()
        .rerank(question, candidates, 5)
        .await
        .unwrap();

    let reranker = HeuristicReranker::default();
    for r in &out {
        let expected = 0.7 * r.original_score + 0.1 * reranker.position_boost(r.result.position());
        assert!((r.rerank_score - expected).abs() < 1e-5);
    }
}

#[tokio::test]
async fn similarity_only_weights_preserve_vector_order() {
    let h = harness(ChunkingConfig {
        chunk_size: 250,
        overlap: 0.0,
    });
    h.service
        .index(&long_document(3_000), "earth.txt", true)
        .await
        .unwrap();

    let candidates = h.client.search("glaciers fresh water", 6).await.unwrap();
    let reranker = HeuristicReranker::new(RerankConfig {
        similarity_weight: 1.0,
        term_frequency_weight: 0.0,
        position_weight: 0.0,
        ..Default::default()
    })
    .unwrap();
    let out = reranker
        .rerank("glaciers fresh water", candidates.clone(), 6)
        .await
        .unwrap();

    let before: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    let after: Vec<&str> = out.iter().map(|r| r.result.id.as_str()).collect();
    assert_eq!(before, after);
}
