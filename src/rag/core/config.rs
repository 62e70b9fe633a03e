//! Configuration for the question-answering subsystem.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::rag::core::errors::{RetrievalError, RetrievalResult};

/// Top-level configuration for the retrieval engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Hybrid retrieval settings.
    pub hybrid: HybridConfig,
    /// BM25 scoring parameters.
    pub lexical: Bm25Config,
    /// Embedding model settings.
    pub embedding: EmbeddingConfig,
    /// Index and unit store locations.
    pub storage: StorageConfig,
    /// Chunking settings used at ingestion.
    pub chunking: ChunkingConfig,
    /// Completion model settings.
    pub llm: LlmConfig,
    /// Prompt construction settings.
    pub prompt: PromptConfig,
}

impl RagConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> RetrievalResult<()> {
        self.hybrid.validate()?;
        self.lexical.validate()?;

        if self.embedding.ndims == 0 {
            return Err(RetrievalError::InvalidConfig(
                "embedding.ndims must be > 0".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(RetrievalError::InvalidConfig(
                "embedding.batch_size must be > 0".to_string(),
            ));
        }

        if self.storage.collection.trim().is_empty() {
            return Err(RetrievalError::InvalidConfig(
                "storage.collection must not be empty".to_string(),
            ));
        }

        if !is_valid_table_name(&self.storage.table) {
            return Err(RetrievalError::InvalidConfig(format!(
                "storage.table `{}` must be alphanumeric or underscore",
                self.storage.table
            )));
        }

        if self.prompt.max_chars == 0 {
            return Err(RetrievalError::InvalidConfig(
                "prompt.max_chars must be > 0".to_string(),
            ));
        }

        if let Some(base_url) = &self.embedding.base_url {
            Url::parse(base_url)?;
        }

        if let Some(base_url) = &self.llm.base_url {
            Url::parse(base_url)?;
        }

        Ok(())
    }
}

fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Per-retriever parameters, fixed when the retriever is wired in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieverConfig {
    /// Maximum number of units requested from the retriever.
    pub top_k: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// What the hybrid retriever does when one constituent retriever fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return the surviving retriever's results, flagged as partial.
    #[default]
    FailOpen,
    /// Propagate the failure and return no candidates.
    FailClosed,
}

/// How dense and lexical results are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Dense results in dense order, then lexical-only results in lexical order.
    #[default]
    DenseFirst,
    /// Weighted reciprocal rank fusion; shared units keep the dense entry.
    ReciprocalRank {
        /// RRF constant k (typically 60).
        k: f64,
        /// Weight applied to dense ranks.
        dense_weight: f64,
        /// Weight applied to lexical ranks.
        lexical_weight: f64,
    },
}

impl MergeStrategy {
    /// Reciprocal rank fusion with the usual constant and equal weights.
    #[must_use]
    pub const fn balanced_rrf() -> Self {
        Self::ReciprocalRank {
            k: 60.0,
            dense_weight: 0.5,
            lexical_weight: 0.5,
        }
    }
}

/// Hybrid retrieval settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    /// Dense retriever parameters.
    pub dense: RetrieverConfig,
    /// Lexical retriever parameters.
    pub lexical: RetrieverConfig,
    /// Behavior when one retriever fails.
    pub failure_policy: FailurePolicy,
    /// How the two result lists are combined.
    pub merge: MergeStrategy,
    /// Report units whose id is shared but whose content differs.
    pub check_integrity: bool,
    /// Longest accepted query, in characters.
    pub max_query_chars: usize,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            dense: RetrieverConfig::default(),
            lexical: RetrieverConfig::default(),
            failure_policy: FailurePolicy::default(),
            merge: MergeStrategy::default(),
            check_integrity: true,
            max_query_chars: 2000,
        }
    }
}

impl HybridConfig {
    /// Validate hybrid settings.
    ///
    /// # Errors
    /// Returns an error if a top-k is zero or fusion parameters are invalid.
    pub fn validate(&self) -> RetrievalResult<()> {
        if self.dense.top_k == 0 {
            return Err(RetrievalError::InvalidConfig(
                "hybrid.dense.top_k must be > 0".to_string(),
            ));
        }

        if self.lexical.top_k == 0 {
            return Err(RetrievalError::InvalidConfig(
                "hybrid.lexical.top_k must be > 0".to_string(),
            ));
        }

        if self.max_query_chars == 0 {
            return Err(RetrievalError::InvalidConfig(
                "hybrid.max_query_chars must be > 0".to_string(),
            ));
        }

        if let MergeStrategy::ReciprocalRank {
            k,
            dense_weight,
            lexical_weight,
        } = self.merge
        {
            if k <= 0.0 || dense_weight < 0.0 || lexical_weight < 0.0 {
                return Err(RetrievalError::InvalidConfig(
                    "reciprocal rank k must be > 0 and weights >= 0".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// BM25 Okapi parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Config {
    /// Term frequency saturation.
    pub k1: f64,
    /// Length normalization.
    pub b: f64,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

impl Bm25Config {
    /// Validate BM25 parameters.
    ///
    /// # Errors
    /// Returns an error if `k1` is negative or `b` is outside `[0, 1]`.
    pub fn validate(&self) -> RetrievalResult<()> {
        if self.k1 < 0.0 || !(0.0..=1.0).contains(&self.b) {
            return Err(RetrievalError::InvalidConfig(
                "lexical.k1 must be >= 0 and lexical.b in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Embedding model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama embedding model name.
    pub model: String,
    /// Embedding vector dimensions.
    pub ndims: usize,
    /// Optional custom base URL.
    pub base_url: Option<String>,
    /// Number of texts embedded per request during ingestion.
    pub batch_size: usize,
    /// Minimum cosine similarity kept by the dense retriever.
    pub min_similarity: f64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "bge-m3".to_string(),
            ndims: 1024,
            base_url: None,
            batch_size: 32,
            min_similarity: 0.0,
        }
    }
}

/// Index and unit store locations.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `SQLite` database holding the dense index.
    pub sqlite_path: PathBuf,
    /// Dense index table name.
    pub table: String,
    /// Collection name stored with every unit.
    pub collection: String,
    /// Serialized unit list used to build the lexical index.
    pub unit_store_path: PathBuf,
    /// Directory scanned by the ingestion pipeline.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/chromadb/vectors.sqlite"),
            table: "financial_10k".to_string(),
            collection: "financial_10k".to_string(),
            unit_store_path: PathBuf::from("data/storage/nodes.json"),
            data_dir: PathBuf::from("data/10k"),
        }
    }
}

/// Sentence-window chunking settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Sentences kept on each side of the chunk sentence.
    pub window_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { window_size: 3 }
    }
}

/// Completion model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama completion model name.
    pub model: String,
    /// Temperature for generation.
    pub temperature: f64,
    /// Optional max tokens.
    pub max_tokens: Option<u64>,
    /// Optional custom base URL.
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "llama3:8b".to_string(),
            temperature: 0.1,
            max_tokens: None,
            base_url: None,
        }
    }
}

/// Prompt construction settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Maximum prompt size in characters.
    pub max_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { max_chars: 12_000 }
    }
}
