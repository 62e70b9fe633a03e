//! Answer generation through a completion model.

use std::future::Future;
use std::pin::Pin;

use reqwest::Client as ReqwestClient;
use rig::client::{CompletionClient, Nothing};
use rig::completion::CompletionModel;
use rig::message::AssistantContent;
use rig::providers::ollama;
use tracing::debug;

use crate::rag::core::config::LlmConfig;
use crate::rag::core::errors::{RetrievalError, RetrievalResult};

/// Boxed future type for generator operations.
pub type GenerateFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Produces an answer from a system preamble and a prompt.
pub trait AnswerGenerator: Send + Sync {
    /// Model identifier, reported with answers and evaluation rows.
    fn model_name(&self) -> &str;

    /// Generate a completion.
    ///
    /// # Errors
    /// Returns an error if the model call fails.
    fn generate(&self, preamble: &str, prompt: &str) -> GenerateFuture<'_, RetrievalResult<String>>;
}

/// Generator backed by a local Ollama server.
pub struct OllamaAnswerGenerator {
    model: ollama::CompletionModel,
    model_name: String,
    temperature: f64,
    max_tokens: Option<u64>,
}

impl OllamaAnswerGenerator {
    /// Create a generator from config.
    ///
    /// # Errors
    /// Returns an error if the Ollama client cannot be built.
    pub fn new(config: &LlmConfig) -> RetrievalResult<Self> {
        let builder = ollama::Client::<ReqwestClient>::builder().api_key(Nothing);
        let builder = match &config.base_url {
            Some(base_url) => builder.base_url(base_url),
            None => builder,
        };
        let client = builder.build().map_err(RetrievalError::from)?;
        Ok(Self {
            model: client.completion_model(config.model.clone()),
            model_name: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

impl AnswerGenerator for OllamaAnswerGenerator {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn generate(&self, preamble: &str, prompt: &str) -> GenerateFuture<'_, RetrievalResult<String>> {
        let preamble = preamble.to_string();
        let prompt = prompt.to_string();
        Box::pin(async move {
            debug!("Generating answer with {} ({} prompt chars)", self.model_name, prompt.len());
            let request = self
                .model
                .completion_request(prompt)
                .preamble(preamble)
                .temperature(self.temperature)
                .max_tokens_opt(self.max_tokens)
                .build();
            let response = self.model.completion(request).await?;
            Ok(extract_text(&response.choice).trim().to_string())
        })
    }
}

fn extract_text(choice: &rig::OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect()
}
