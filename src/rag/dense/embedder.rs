//! Text embedding behind a small trait, with an Ollama implementation.

use std::future::Future;
use std::pin::Pin;

use reqwest::Client as ReqwestClient;
use rig::client::{EmbeddingsClient, Nothing};
use rig::embeddings::{Embedding, EmbeddingModel};
use rig::providers::ollama;

use crate::rag::core::config::EmbeddingConfig;
use crate::rag::core::errors::{RetrievalError, RetrievalResult};

/// Boxed future type for embedder operations.
pub type EmbedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Turns text into vectors.
pub trait Embedder: Send + Sync {
    /// Embed one text.
    ///
    /// # Errors
    /// Returns an error if the embedding request fails.
    fn embed_text(&self, text: &str) -> EmbedFuture<'_, RetrievalResult<Embedding>>;

    /// Embed several texts, preserving order.
    ///
    /// # Errors
    /// Returns an error if the embedding request fails.
    fn embed_texts(&self, texts: Vec<String>) -> EmbedFuture<'_, RetrievalResult<Vec<Embedding>>>;

    /// Vector dimensionality.
    fn ndims(&self) -> usize;
}

/// Rig model type used for Ollama embeddings.
pub type OllamaEmbeddingModel = ollama::EmbeddingModel<ReqwestClient>;

/// Build the rig embedding model described by `config`.
///
/// # Errors
/// Returns an error if the client cannot be built.
pub fn ollama_embedding_model(config: &EmbeddingConfig) -> RetrievalResult<OllamaEmbeddingModel> {
    let builder = ollama::Client::<ReqwestClient>::builder().api_key(Nothing);
    let builder = match &config.base_url {
        Some(base_url) => builder.base_url(base_url),
        None => builder,
    };
    let client = builder.build().map_err(RetrievalError::from)?;
    Ok(client.embedding_model_with_ndims(config.model.clone(), config.ndims))
}

/// Embedder backed by a local Ollama server.
#[derive(Clone)]
pub struct OllamaEmbedder {
    model: OllamaEmbeddingModel,
    ndims: usize,
}

impl OllamaEmbedder {
    /// Create an embedder from config.
    ///
    /// # Errors
    /// Returns an error if the client cannot be built.
    pub fn new(config: &EmbeddingConfig) -> RetrievalResult<Self> {
        Ok(Self {
            model: ollama_embedding_model(config)?,
            ndims: config.ndims,
        })
    }
}

impl Embedder for OllamaEmbedder {
    fn embed_text(&self, text: &str) -> EmbedFuture<'_, RetrievalResult<Embedding>> {
        let text = text.to_string();
        Box::pin(async move { Ok(self.model.embed_text(&text).await?) })
    }

    fn embed_texts(&self, texts: Vec<String>) -> EmbedFuture<'_, RetrievalResult<Vec<Embedding>>> {
        Box::pin(async move { Ok(self.model.embed_texts(texts).await?) })
    }

    fn ndims(&self) -> usize {
        self.ndims
    }
}
