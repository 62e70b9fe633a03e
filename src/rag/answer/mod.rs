//! Answer stage: turns retrieved candidates into a cited answer.

pub mod generator;
pub mod prompt;

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::rag::core::config::PromptConfig;
use crate::rag::core::errors::RetrievalResult;
use crate::rag::retrieval::candidate::CandidateSummary;
use crate::rag::retrieval::hybrid::{HybridRetrieval, PartialRetrieverFailure};

pub use generator::{AnswerGenerator, GenerateFuture, OllamaAnswerGenerator};
pub use prompt::{ContextPassage, SYSTEM_PROMPT, build_prompt, fit_to_budget};

/// Answer returned when retrieval produced no candidates.
pub const NO_CONTEXT_ANSWER: &str =
    "I could not find any relevant passage in the indexed filings to answer this question.";

/// Generated answer with its supporting passages.
#[derive(Clone, Debug, Serialize)]
pub struct Answer {
    /// Answer text.
    pub text: String,
    /// Distinct source documents, in candidate order.
    pub sources: Vec<String>,
    /// Candidates the answer was generated from.
    pub candidates: Vec<CandidateSummary>,
    /// Set when one retriever failed and the other one's results were used.
    pub partial: Option<PartialRetrieverFailure>,
}

/// Builds the prompt and calls the generator.
#[derive(Clone)]
pub struct AnswerStage {
    generator: Arc<dyn AnswerGenerator>,
    prompt: PromptConfig,
}

impl AnswerStage {
    /// Create an answer stage.
    #[must_use]
    pub fn new(generator: Arc<dyn AnswerGenerator>, prompt: PromptConfig) -> Self {
        Self { generator, prompt }
    }

    /// Generator model name.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Answer `question` from a retrieval result.
    ///
    /// # Errors
    /// Returns an error if the generator fails.
    pub async fn answer(&self, question: &str, retrieval: HybridRetrieval) -> RetrievalResult<Answer> {
        let HybridRetrieval {
            candidates, partial, ..
        } = retrieval;

        let mut sources: Vec<String> = Vec::new();
        for name in candidates.iter().filter_map(|c| c.unit.citation()) {
            if !sources.iter().any(|s| s == name) {
                sources.push(name.to_string());
            }
        }
        let summaries = candidates.iter().map(|c| c.summary()).collect();

        if candidates.is_empty() {
            info!("No candidates for question; skipping generation");
            return Ok(Answer {
                text: NO_CONTEXT_ANSWER.to_string(),
                sources,
                candidates: summaries,
                partial,
            });
        }

        let passages = candidates.iter().map(ContextPassage::from_candidate).collect();
        let (prompt, kept) = fit_to_budget(question, passages, self.prompt.max_chars);
        info!(
            "Prompt built with {kept}/{} passages ({} chars)",
            candidates.len(),
            prompt.chars().count()
        );

        let text = self.generator.generate(SYSTEM_PROMPT, &prompt).await?;
        Ok(Answer {
            text,
            sources,
            candidates: summaries,
            partial,
        })
    }
}
