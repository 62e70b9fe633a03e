//! Question answering over 10-K filings.
//!
//! - `core`: identifiers, units, metadata, configuration and errors
//! - `retrieval`: the retriever contract and the hybrid dense + lexical retriever
//! - `lexical`: BM25 and TF-IDF scoring
//! - `dense`: embedders and vector indexes
//! - `ingest`: document loading, sentence-window chunking and index population
//! - `answer`: prompt assembly and answer generation
//! - `engine`: the assembled engine
//! - `evaluation`: batch question runs written to CSV

pub mod answer;
pub mod core;
pub mod dense;
pub mod engine;
pub mod evaluation;
pub mod ingest;
pub mod lexical;
pub mod retrieval;

#[cfg(test)]
pub(crate) mod test_support;

pub use answer::{Answer, AnswerGenerator, AnswerStage, OllamaAnswerGenerator};
pub use self::core::{
    FailurePolicy, HybridConfig, MergeStrategy, RagConfig, RetrievableUnit, RetrievalError,
    RetrievalResult, UnitId, UnitMetadata,
};
pub use dense::{DenseSink, Embedder, InMemoryDenseIndex, OllamaEmbedder, SqliteDenseIndex};
pub use engine::RagEngine;
pub use evaluation::{EvaluationRow, evaluate, write_csv};
pub use ingest::{IngestionPipeline, IngestionReport, UnitStore};
pub use lexical::{LexicalRetriever, TfidfIndex, TfidfRetriever};
pub use retrieval::{
    CandidateSet, CandidateSummary, HybridRetrieval, HybridRetriever, IndexInconsistency,
    PartialRetrieverFailure, RetrievalSource, Retriever, ScoredCandidate, ScoredUnit,
};
