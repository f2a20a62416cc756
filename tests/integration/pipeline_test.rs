//! Index -> query flow through `RagService`.

use citerag::services::knowledge::pipeline::INSUFFICIENT_CONTEXT_ANSWER;
use citerag::services::knowledge::{ChunkingConfig, QueryOutcome};
use citerag::AppError;

use super::common::{default_harness, harness, long_document};

const CAPITALS: &str = "Paris is the capital of France. It is known for the Eiffel Tower, \
the Louvre and its cafes along the Seine.";

const PHOTOSYNTHESIS: &str = "Photosynthesis lets plants turn sunlight, water and carbon dioxide \
into glucose and oxygen inside their chloroplasts.";

#[tokio::test]
async fn index_then_query_returns_cited_answer() {
    let h = default_harness();
    let document = format!("{}\n\n{}", long_document(6_000), CAPITALS);
    let stats = h.service.index(&document, "atlas.txt", true).await.unwrap();
    assert_eq!(stats.vectors_stored, stats.chunks_created);
    assert!(stats.chunks_created >= 2);

    let outcome = h
        .service
        .query("What is the capital of France?", None, None)
        .await
        .unwrap();

    let response = match outcome {
        QueryOutcome::Answered(response) => response,
        QueryOutcome::InsufficientContext(_) => panic!("expected an answer"),
    };
    assert_eq!(h.model.prompt_count(), 1);
    assert_eq!(response.metadata.model, "scripted-model");
    assert_eq!(response.metadata.total_chunks, stats.chunks_created as u64);
    assert!(response.metadata.reranked_chunks <= 3);
    assert_eq!(response.citations.len(), response.metadata.reranked_chunks);
    assert!(response.citations.iter().all(|c| c.source == "atlas.txt"));
    assert!(response.citations.iter().all(|c| c.text.ends_with("...")));

    let prompt = h.model.last_prompt().unwrap();
    assert!(prompt.contains("[Source 1]: "));
    assert!(prompt.contains("What is the capital of France?"));
}

#[tokio::test]
async fn empty_store_short_circuits() {
    let h = default_harness();
    let outcome = h.service.query("Anything indexed yet?", None, None).await.unwrap();

    let response = match outcome {
        QueryOutcome::InsufficientContext(response) => response,
        QueryOutcome::Answered(_) => panic!("nothing was indexed"),
    };
    assert_eq!(response.answer, INSUFFICIENT_CONTEXT_ANSWER);
    assert!(response.citations.is_empty());
    assert_eq!(response.metadata.retrieved_chunks, 0);
    assert_eq!(response.metadata.reranked_chunks, 0);
    assert_eq!(response.metadata.tokens_used, 0);
    assert_eq!(h.model.prompt_count(), 0);
}

#[tokio::test]
async fn stored_chunk_text_survives_round_trip() {
    let h = harness(ChunkingConfig {
        chunk_size: 400,
        overlap: 0.0,
    });
    let document = format!("   {}   ", CAPITALS);
    h.service.index(&document, "capitals.txt", true).await.unwrap();

    let results = h.client.search(CAPITALS, 1).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text(), CAPITALS);
    assert_eq!(results[0].chunk.metadata.start_char, 0);
    assert_eq!(results[0].chunk.metadata.chunk_size, CAPITALS.chars().count());
}

#[tokio::test]
async fn relevant_chunk_outranks_unrelated_one() {
    let h = harness(ChunkingConfig {
        chunk_size: 200,
        overlap: 0.0,
    });
    h.service.index(PHOTOSYNTHESIS, "biology.txt", false).await.unwrap();
    h.service.index(CAPITALS, "geography.txt", false).await.unwrap();

    let response = h
        .service
        .query("What is the capital of France?", None, Some(2))
        .await
        .unwrap()
        .into_response();

    assert_eq!(response.citations.len(), 2);
    assert_eq!(response.citations[0].source, "geography.txt");
    assert!(response.citations[0].relevance_score > response.citations[1].relevance_score);
}

#[tokio::test]
async fn too_little_text_is_empty_input() {
    let h = default_harness();
    let err = h.service.index("   short   ", "tiny.txt", true).await.unwrap_err();
    assert!(matches!(err, AppError::EmptyInput(_)));
}

#[tokio::test]
async fn clear_previous_controls_accumulation() {
    let h = harness(ChunkingConfig {
        chunk_size: 500,
        overlap: 0.2,
    });
    let doc = long_document(2_000);

    let first = h.service.index(&doc, "a.txt", true).await.unwrap();
    let kept = h.service.index(&doc, "b.txt", false).await.unwrap();
    assert_eq!(
        h.service.get_stats().await.unwrap().total_vectors,
        (first.chunks_created + kept.chunks_created) as u64
    );

    let replaced = h.service.index(&doc, "c.txt", true).await.unwrap();
    assert_eq!(
        h.service.get_stats().await.unwrap().total_vectors,
        replaced.chunks_created as u64
    );

    h.service.clear_all().await.unwrap();
    assert_eq!(h.service.get_stats().await.unwrap().total_vectors, 0);
}
