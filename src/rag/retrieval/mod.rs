//! Hybrid retrieval: retriever contract, candidate sets, merging and integrity checks.

pub mod candidate;
pub mod fusion;
pub mod hybrid;
pub mod integrity;
pub mod retriever;

pub use candidate::{CandidateSet, CandidateSummary, RetrievalSource, ScoredCandidate, ScoredUnit};
pub use fusion::{MergeOutcome, merge_dense_first, merge_reciprocal_rank};
pub use hybrid::{HybridRetrieval, HybridRetriever, PartialRetrieverFailure};
pub use integrity::{InconsistencyKind, IndexInconsistency, compare_units};
pub use retriever::{RetrieveFuture, Retriever};
