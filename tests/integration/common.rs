//! Shared harness for the integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use citerag::services::embedding::{EmbeddingGateway, HashingEmbeddingProvider};
use citerag::services::knowledge::{
    AnswerSynthesizer, ChunkingConfig, HeuristicReranker, RagService, RetrievalConfig,
    SlidingWindowChunker,
};
use citerag::services::vectorstore::{HnswVectorIndex, VectorIndexClient};
use citerag_llm::{GenerationOptions, LlmProvider, LlmResponse, LlmResult, UsageStats};

pub const DIMENSION: usize = 256;

/// Answers with a fixed text and keeps every prompt it receives.
pub struct ScriptedModel {
    pub answer: String,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for ScriptedModel {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> LlmResult<LlmResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(LlmResponse {
            content: Some(self.answer.clone()),
            finish_reason: Some("STOP".to_string()),
            usage: UsageStats::default(),
            model: "scripted-model".to_string(),
        })
    }
}

pub struct Harness {
    pub service: RagService,
    pub client: Arc<VectorIndexClient>,
    pub model: Arc<ScriptedModel>,
}

pub fn harness(chunking: ChunkingConfig) -> Harness {
    let gateway = EmbeddingGateway::new(Arc::new(HashingEmbeddingProvider::new(DIMENSION).unwrap()), 4);
    let client = Arc::new(VectorIndexClient::new(
        Arc::new(HnswVectorIndex::new(DIMENSION, 10_000).unwrap()),
        Arc::new(gateway),
    ));
    let model = ScriptedModel::new("According to [Source 1], the answer is in the context.");
    let synthesizer = AnswerSynthesizer::new(model.clone(), GenerationOptions::default()).unwrap();
    let service = RagService::new(
        Arc::new(SlidingWindowChunker::new(chunking).unwrap()),
        client.clone(),
        Arc::new(HeuristicReranker::default()),
        synthesizer,
        RetrievalConfig::default(),
    )
    .unwrap();

    Harness {
        service,
        client,
        model,
    }
}

pub fn default_harness() -> Harness {
    harness(ChunkingConfig::default())
}

/// Paragraph-structured prose of at least `min_chars` characters.
pub fn long_document(min_chars: usize) -> String {
    const PARAGRAPHS: &[&str] = &[
        "The Amazon rainforest spans nine countries and holds roughly ten percent of all known species on Earth.",
        "Glaciers store about sixty-nine percent of the world's fresh water, most of it in Antarctica and Greenland.",
        "Coral reefs cover less than one percent of the ocean floor yet support about a quarter of marine life.",
        "The Sahara is the largest hot desert, stretching across eleven countries in northern Africa.",
        "Mangrove forests protect coastlines from erosion and act as nurseries for many fish species.",
    ];
    let mut text = String::new();
    let mut i = 0;
    while text.chars().count() < min_chars {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(PARAGRAPHS[i % PARAGRAPHS.len()]);
        i += 1;
    }
    text
}
