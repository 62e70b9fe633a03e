//! Core retrieval types and identifiers.

pub mod config;
pub mod errors;
pub mod ids;
pub mod metadata;
pub mod unit;

pub use config::{
    Bm25Config, ChunkingConfig, EmbeddingConfig, FailurePolicy, HybridConfig, LlmConfig,
    MergeStrategy, PromptConfig, RagConfig, RetrieverConfig, StorageConfig,
};
pub use errors::{RetrievalError, RetrievalResult};
pub use ids::{UnitId, UnitIdParseError};
pub use metadata::{MetadataValue, UnitMetadata};
pub use unit::RetrievableUnit;
