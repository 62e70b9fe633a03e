//! Deterministic fakes shared by the unit tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rig::embeddings::Embedding;

use crate::rag::answer::generator::{AnswerGenerator, GenerateFuture};
use crate::rag::core::errors::{RetrievalError, RetrievalResult};
use crate::rag::core::unit::RetrievableUnit;
use crate::rag::dense::embedder::{EmbedFuture, Embedder};
use crate::rag::lexical::tokenizer::tokenize;
use crate::rag::retrieval::candidate::ScoredUnit;
use crate::rag::retrieval::retriever::{RetrieveFuture, Retriever};

/// Unit `id` with text derived from the id.
pub fn scored_unit(id: &str, score: Option<f64>) -> ScoredUnit {
    ScoredUnit::new(Arc::new(RetrievableUnit::new(id, format!("chunk {id}"))), score)
}

/// Units for `ids`, in order.
pub fn scored_units(ids: &[&str]) -> Vec<ScoredUnit> {
    ids.iter().map(|id| scored_unit(id, None)).collect()
}

/// Retriever returning a fixed list or a fixed error.
pub struct ScriptedRetriever {
    outcome: Result<Vec<ScoredUnit>, String>,
    calls: Option<Arc<AtomicUsize>>,
}

impl ScriptedRetriever {
    pub fn returning(units: Vec<ScoredUnit>) -> Self {
        Self {
            outcome: Ok(units),
            calls: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
            calls: None,
        }
    }

    pub fn counting(mut self, calls: Arc<AtomicUsize>) -> Self {
        self.calls = Some(calls);
        self
    }
}

impl Retriever for ScriptedRetriever {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn retrieve(&self, _query: &str, _k: usize) -> RetrieveFuture<'_, RetrievalResult<Vec<ScoredUnit>>> {
        Box::pin(async move {
            if let Some(calls) = &self.calls {
                calls.fetch_add(1, Ordering::SeqCst);
            }
            match &self.outcome {
                Ok(units) => Ok(units.clone()),
                Err(reason) => Err(RetrievalError::Io(std::io::Error::other(reason.clone()))),
            }
        })
    }
}

/// Bag-of-words embedder hashing each term into a fixed-size vector.
pub struct HashingEmbedder {
    ndims: usize,
}

impl HashingEmbedder {
    pub const fn new(ndims: usize) -> Self {
        Self { ndims }
    }

    fn vector(&self, text: &str) -> Vec<f64> {
        let mut vec = vec![0.0; self.ndims];
        for token in tokenize(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = usize::try_from(hasher.finish() % self.ndims as u64).unwrap();
            vec[bucket] += 1.0;
        }
        vec
    }
}

impl Embedder for HashingEmbedder {
    fn embed_text(&self, text: &str) -> EmbedFuture<'_, RetrievalResult<Embedding>> {
        let embedding = Embedding {
            document: text.to_string(),
            vec: self.vector(text),
        };
        Box::pin(async move { Ok(embedding) })
    }

    fn embed_texts(&self, texts: Vec<String>) -> EmbedFuture<'_, RetrievalResult<Vec<Embedding>>> {
        Box::pin(async move {
            Ok(texts
                .into_iter()
                .map(|text| Embedding {
                    vec: self.vector(&text),
                    document: text,
                })
                .collect())
        })
    }

    fn ndims(&self) -> usize {
        self.ndims
    }
}

/// Generator that records prompts and replies with a fixed answer or error.
pub struct RecordingGenerator {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl AnswerGenerator for RecordingGenerator {
    fn model_name(&self) -> &str {
        "recording"
    }

    fn generate(&self, _preamble: &str, prompt: &str) -> GenerateFuture<'_, RetrievalResult<String>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self
            .reply
            .clone()
            .map_err(|reason| RetrievalError::Io(std::io::Error::other(reason)));
        Box::pin(async move { reply })
    }
}
