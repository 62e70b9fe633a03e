//! Question-answering engine: hybrid retrieval plus answer generation.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use tracing::info;

use crate::rag::answer::{Answer, AnswerGenerator, AnswerStage, OllamaAnswerGenerator};
use crate::rag::core::config::RagConfig;
use crate::rag::core::errors::RetrievalResult;
use crate::rag::dense::sqlite_index::SqliteDenseIndex;
use crate::rag::ingest::unit_store::UnitStore;
use crate::rag::lexical::bm25::LexicalRetriever;
use crate::rag::retrieval::hybrid::{HybridRetrieval, HybridRetriever};

static ENGINE: OnceCell<Arc<RagEngine>> = OnceCell::const_new();

/// Retrieval and answering over the ingested filings.
///
/// Read-only once built; share it behind an `Arc`.
#[derive(Clone)]
pub struct RagEngine {
    hybrid: HybridRetriever,
    answer: AnswerStage,
}

impl RagEngine {
    /// Assemble an engine from its parts.
    #[must_use]
    pub const fn new(hybrid: HybridRetriever, answer: AnswerStage) -> Self {
        Self { hybrid, answer }
    }

    /// Open the dense index, rebuild the lexical index from the unit store
    /// and connect the completion model.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or a store cannot be
    /// opened.
    pub async fn from_config(config: &RagConfig) -> RetrievalResult<Self> {
        config.validate()?;
        let started = Instant::now();

        let dense = SqliteDenseIndex::open(config).await?;
        let units = UnitStore::new(&config.storage.unit_store_path, &config.storage.collection)
            .load()
            .await?;
        let lexical = LexicalRetriever::from_units(units, config.lexical)?;
        let hybrid = HybridRetriever::new(Arc::new(dense), Arc::new(lexical), config.hybrid.clone())?;

        let generator = OllamaAnswerGenerator::new(&config.llm)?;
        let answer = AnswerStage::new(Arc::new(generator), config.prompt);

        info!(
            "RAG engine ready with {} in {:?}",
            config.llm.model,
            started.elapsed()
        );
        Ok(Self::new(hybrid, answer))
    }

    /// Process-wide engine, built from `config` on first call.
    ///
    /// Later calls return the same instance and ignore `config`.
    ///
    /// # Errors
    /// Returns an error if the first initialisation fails; a later call
    /// retries.
    pub async fn global(config: &RagConfig) -> RetrievalResult<Arc<Self>> {
        ENGINE
            .get_or_try_init(|| async { Self::from_config(config).await.map(Arc::new) })
            .await
            .map(Arc::clone)
    }

    /// Same retrieval, different generator.
    #[must_use]
    pub fn with_generator(&self, generator: Arc<dyn AnswerGenerator>, config: &RagConfig) -> Self {
        Self {
            hybrid: self.hybrid.clone(),
            answer: AnswerStage::new(generator, config.prompt),
        }
    }

    /// Generator model name.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.answer.model_name()
    }

    /// Retrieve candidates for `query`.
    ///
    /// # Errors
    /// See [`HybridRetriever::retrieve`].
    pub async fn retrieve(&self, query: &str) -> RetrievalResult<HybridRetrieval> {
        self.hybrid.retrieve(query).await
    }

    /// Retrieve and answer `question`.
    ///
    /// # Errors
    /// Returns an error if retrieval or generation fails.
    pub async fn ask(&self, question: &str) -> RetrievalResult<Answer> {
        let retrieval = self.hybrid.retrieve(question).await?;
        self.answer.answer(question.trim(), retrieval).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::core::config::{Bm25Config, HybridConfig, PromptConfig};
    use crate::rag::core::metadata::UnitMetadata;
    use crate::rag::core::unit::RetrievableUnit;
    use crate::rag::dense::memory_index::InMemoryDenseIndex;
    use crate::rag::test_support::{HashingEmbedder, RecordingGenerator, ScriptedRetriever};

    fn units() -> Vec<RetrievableUnit> {
        [
            ("nvda.pdf#000000", "nvda.pdf", "Nvidia revenue was 60.9 billion in fiscal 2024."),
            ("meta.pdf#000000", "meta.pdf", "Reality Labs reported an operating loss of 16.1 billion."),
            ("goog.pdf#000000", "goog.pdf", "Generative AI may expose us to new risks."),
        ]
        .into_iter()
        .map(|(id, file, text)| {
            RetrievableUnit::new(id, text).with_metadata(UnitMetadata::new().with("file_name", file))
        })
        .collect()
    }

    async fn engine(generator: Arc<RecordingGenerator>) -> RagEngine {
        let dense = InMemoryDenseIndex::new(Arc::new(HashingEmbedder::new(64)), 0.1);
        dense.index_units(units()).await.unwrap();
        let lexical = LexicalRetriever::from_units(units(), Bm25Config::default()).unwrap();
        let hybrid =
            HybridRetriever::new(Arc::new(dense), Arc::new(lexical), HybridConfig::default()).unwrap();
        RagEngine::new(hybrid, AnswerStage::new(generator, PromptConfig::default()))
    }

    #[tokio::test]
    async fn ask_cites_retrieved_documents() {
        let generator = Arc::new(RecordingGenerator::new("Operating loss of $16.1B."));
        let engine = engine(generator.clone()).await;

        let answer = engine.ask("Reality Labs operating loss").await.unwrap();
        assert_eq!(answer.text, "Operating loss of $16.1B.");
        assert_eq!(answer.sources.first().map(String::as_str), Some("meta.pdf"));
        assert!(answer.partial.is_none());
        assert!(generator.prompts()[0].contains("Reality Labs"));
    }

    #[tokio::test]
    async fn invalid_question_never_reaches_generator() {
        let generator = Arc::new(RecordingGenerator::new("unused"));
        let engine = engine(generator.clone()).await;
        assert!(engine.ask("  ").await.unwrap_err().is_invalid_input());
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn dense_outage_still_answers_from_lexical() {
        let lexical = LexicalRetriever::from_units(units(), Bm25Config::default()).unwrap();
        let hybrid = HybridRetriever::new(
            Arc::new(ScriptedRetriever::failing("connection refused")),
            Arc::new(lexical),
            HybridConfig::default(),
        )
        .unwrap();
        let generator = Arc::new(RecordingGenerator::new("Nvidia revenue was $60.9B."));
        let engine = RagEngine::new(
            hybrid,
            AnswerStage::new(generator, PromptConfig::default()),
        );

        let answer = engine.ask("Nvidia revenue fiscal 2024").await.unwrap();
        assert!(answer.partial.is_some());
        assert_eq!(answer.sources, vec!["nvda.pdf"]);

        let swapped = engine.with_generator(
            Arc::new(RecordingGenerator::new("other")),
            &RagConfig::default(),
        );
        assert_eq!(swapped.model_name(), "recording");
        assert_eq!(swapped.retrieve("Nvidia revenue").await.unwrap().candidates.len(), 1);
    }
}
