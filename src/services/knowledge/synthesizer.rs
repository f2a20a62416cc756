//! Answer Synthesizer
//!
//! Builds a grounded prompt from reranked chunks, calls the generative model
//! once, and attaches citations for every chunk that was offered as context.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use citerag_core::{Citation, RerankedResult};
use citerag_llm::{GenerationOptions, LlmError, LlmProvider};

use super::chunker::CHARS_PER_TOKEN;
use crate::utils::error::{AppError, AppResult};

/// Characters of chunk text kept in each citation preview.
pub const CITATION_PREVIEW_CHARS: usize = 150;

const INSTRUCTIONS: &str = "You are a helpful assistant that answers questions using only the context provided below.

Follow these rules:
1. Base your answer only on the information in the context.
2. If the context does not contain enough information to answer, say so clearly.
3. Be precise and concise.
4. Refer to the sources you use, for example [Source 1].
5. When several sources are relevant, mention each of them.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizedAnswer {
    pub answer: String,
    /// One per context chunk, in context order.
    pub citations: Vec<Citation>,
    /// Estimate over prompt plus answer, not provider-reported usage.
    pub tokens_used: usize,
    pub model_name: String,
}

pub struct AnswerSynthesizer {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
}

impl AnswerSynthesizer {
    pub fn new(provider: Arc<dyn LlmProvider>, options: GenerationOptions) -> AppResult<Self> {
        options.validate().map_err(AppError::config)?;
        Ok(Self { provider, options })
    }

    pub fn model_name(&self) -> &str {
        self.provider.model()
    }

    /// Generate an answer to `query` grounded in `context`.
    pub async fn generate(
        &self,
        query: &str,
        context: &[RerankedResult],
    ) -> AppResult<SynthesizedAnswer> {
        let prompt = build_prompt(query, &build_context(context));
        debug!(
            provider = self.provider.name(),
            context_chunks = context.len(),
            prompt_chars = prompt.chars().count(),
            "generating answer"
        );

        let response = self.provider.generate(&prompt, &self.options).await?;
        let answer = response
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyResponse {
                message: format!(
                    "{} returned no text (finish reason: {})",
                    self.provider.name(),
                    response.finish_reason.as_deref().unwrap_or("unknown")
                ),
            })?;

        let citations = context
            .iter()
            .map(|item| Citation::from_reranked(item, CITATION_PREVIEW_CHARS))
            .collect();
        let tokens_used = exchange_tokens(&prompt, &answer);
        let model_name = if response.model.is_empty() {
            self.provider.model().to_string()
        } else {
            response.model
        };

        info!(model = %model_name, tokens_used, "answer generated");
        Ok(SynthesizedAnswer {
            answer,
            citations,
            tokens_used,
            model_name,
        })
    }
}

/// Token estimate over prompt and answer taken as one text.
fn exchange_tokens(prompt: &str, answer: &str) -> usize {
    let chars = prompt.chars().count() + answer.chars().count();
    (chars as f64 / CHARS_PER_TOKEN).ceil() as usize
}

/// `[Source i]: text` blocks separated by blank lines, numbered from 1.
pub fn build_context(context: &[RerankedResult]) -> String {
    context
        .iter()
        .enumerate()
        .map(|(i, item)| format!("[Source {}]: {}", i + 1, item.result.text()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "{}\n\n**Context:**\n{}\n\n**Question:** {}\n\n**Answer:**",
        INSTRUCTIONS, context, query
    )
}
