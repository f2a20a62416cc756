//! Command handlers and configuration wiring.

use citerag::commands::{
    clear_index, get_index_stats, index_document, query_knowledge, IndexRequest, QueryRequest,
    DEFAULT_SOURCE,
};
use citerag::services::knowledge::QueryOutcome;
use citerag::AppState;

use super::common::long_document;

fn offline_state() -> (AppState, tempfile::TempDir) {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "chunking": { "chunk_size": 600, "overlap": 0.15 },
            "embedding": { "provider": "hashing", "model": "hashing", "dimension": 128 },
            "vector_store": { "backend": "hnsw", "max_elements": 1000 },
            "rerank": { "enabled": true }
        }"#,
    )
    .unwrap();
    (AppState::initialize(Some(&path)).unwrap(), temp)
}

#[tokio::test]
async fn index_and_stats_through_handlers() {
    let (state, _dir) = offline_state();
    let rag = state.rag();

    let response = index_document(
        &rag,
        IndexRequest {
            text: long_document(2_000),
            source: None,
            clear_previous: None,
        },
    )
    .await;
    assert!(response.success, "{:?}", response.error);
    let stats = response.data.unwrap();
    assert!(stats.chunks_created >= 3);

    let hits = state.rag().get_stats().await.unwrap();
    assert_eq!(hits.total_vectors, stats.chunks_created as u64);
    assert_eq!(hits.dimension, 128);

    let response = get_index_stats(&rag).await;
    assert_eq!(response.data.unwrap().total_vectors, stats.chunks_created as u64);

    let cleared = clear_index(&rag).await;
    assert!(cleared.data.unwrap().cleared);
    assert_eq!(get_index_stats(&rag).await.data.unwrap().total_vectors, 0);
}

#[tokio::test]
async fn handlers_reject_bad_input_before_the_pipeline() {
    let (state, _dir) = offline_state();
    let rag = state.rag();

    let response = index_document(
        &rag,
        IndexRequest {
            text: "short".to_string(),
            source: Some(DEFAULT_SOURCE.to_string()),
            clear_previous: Some(true),
        },
    )
    .await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("at least 50"));

    let response = query_knowledge(
        &rag,
        QueryRequest {
            question: "?".to_string(),
            top_k: None,
            rerank_top_k: None,
        },
    )
    .await;
    assert!(!response.success);
}

#[tokio::test]
async fn query_on_empty_index_is_a_successful_fallback() {
    let (state, _dir) = offline_state();
    let response = query_knowledge(
        &state.rag(),
        QueryRequest {
            question: "Where are the glaciers?".to_string(),
            top_k: Some(4),
            rerank_top_k: Some(2),
        },
    )
    .await;
    assert!(response.success);
    assert!(matches!(response.data, Some(QueryOutcome::InsufficientContext(_))));
}
