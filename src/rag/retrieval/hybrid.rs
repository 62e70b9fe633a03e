//! Hybrid retrieval combining a dense and a lexical retriever.
//!
//! Both retrievers run on every query, concurrently, and their results are
//! merged into one candidate set unique by unit id. Dense results keep their
//! rank; lexical results only contribute units the dense retriever missed.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::rag::core::config::{FailurePolicy, HybridConfig, MergeStrategy};
use crate::rag::core::errors::{RetrievalError, RetrievalResult};
use crate::rag::retrieval::candidate::{CandidateSet, RetrievalSource, ScoredUnit};
use crate::rag::retrieval::fusion::{MergeOutcome, merge_dense_first, merge_reciprocal_rank};
use crate::rag::retrieval::integrity::IndexInconsistency;
use crate::rag::retrieval::retriever::Retriever;

/// A constituent retriever failed and the other one's results were used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PartialRetrieverFailure {
    /// Retriever that failed.
    pub failed: RetrievalSource,
    /// Failure description.
    pub reason: String,
}

/// Candidates for one query plus diagnostics.
#[derive(Clone, Debug, Default)]
pub struct HybridRetrieval {
    /// Deduplicated candidates, dense rank order first.
    pub candidates: CandidateSet,
    /// Set when a retriever failed under the fail-open policy.
    pub partial: Option<PartialRetrieverFailure>,
    /// Shared ids whose content differs between the two indexes.
    pub inconsistencies: Vec<IndexInconsistency>,
}

impl HybridRetrieval {
    /// Whether only one retriever contributed.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.partial.is_some()
    }
}

/// Composes a dense and a lexical retriever.
///
/// Holds no per-query state; one instance can serve any number of
/// sequential or concurrent queries.
#[derive(Clone)]
pub struct HybridRetriever {
    dense: Arc<dyn Retriever>,
    lexical: Arc<dyn Retriever>,
    config: HybridConfig,
}

impl HybridRetriever {
    /// Create a hybrid retriever.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(
        dense: Arc<dyn Retriever>,
        lexical: Arc<dyn Retriever>,
        config: HybridConfig,
    ) -> RetrievalResult<Self> {
        config.validate()?;
        Ok(Self {
            dense,
            lexical,
            config,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &HybridConfig {
        &self.config
    }

    /// Retrieve deduplicated candidates for `query`.
    ///
    /// # Errors
    /// - `InvalidInput` if the query is empty or too long (no retriever is called).
    /// - `RetrieverUnavailable` if a retriever fails under the fail-closed policy.
    /// - `AllRetrieversFailed` if both retrievers fail.
    pub async fn retrieve(&self, query: &str) -> RetrievalResult<HybridRetrieval> {
        let query = self.validate_query(query)?;
        let started = Instant::now();

        let dense_k = self.config.dense.top_k;
        let lexical_k = self.config.lexical.top_k;
        let (dense, lexical) = tokio::join!(
            self.dense.retrieve(query, dense_k),
            self.lexical.retrieve(query, lexical_k),
        );

        let dense = self.bound(dense, RetrievalSource::Dense, dense_k);
        let lexical = self.bound(lexical, RetrievalSource::Lexical, lexical_k);

        let (dense, lexical, partial) = match (dense, lexical) {
            (Ok(dense), Ok(lexical)) => (dense, lexical, None),
            (Err(dense_err), Err(lexical_err)) => {
                return Err(RetrievalError::AllRetrieversFailed {
                    dense: dense_err.to_string(),
                    lexical: lexical_err.to_string(),
                });
            }
            (Err(err), Ok(lexical)) => {
                let partial = self.on_failure(RetrievalSource::Dense, &err)?;
                (Vec::new(), lexical, Some(partial))
            }
            (Ok(dense), Err(err)) => {
                let partial = self.on_failure(RetrievalSource::Lexical, &err)?;
                (dense, Vec::new(), Some(partial))
            }
        };

        let dense_count = dense.len();
        let lexical_count = lexical.len();
        let MergeOutcome {
            candidates,
            inconsistencies,
        } = self.merge(dense, lexical);

        info!(
            "Hybrid retrieval: {} dense + {} lexical -> {} candidates in {:?}{}",
            dense_count,
            lexical_count,
            candidates.len(),
            started.elapsed(),
            if partial.is_some() { " (partial)" } else { "" }
        );

        Ok(HybridRetrieval {
            candidates,
            partial,
            inconsistencies,
        })
    }

    fn validate_query<'q>(&self, query: &'q str) -> RetrievalResult<&'q str> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(RetrievalError::InvalidInput("query is empty".to_string()));
        }
        let chars = trimmed.chars().count();
        if chars > self.config.max_query_chars {
            return Err(RetrievalError::InvalidInput(format!(
                "query has {chars} characters, limit is {}",
                self.config.max_query_chars
            )));
        }
        Ok(trimmed)
    }

    /// Tag a retriever error with its source and enforce the `k` bound.
    fn bound(
        &self,
        result: RetrievalResult<Vec<ScoredUnit>>,
        source: RetrievalSource,
        k: usize,
    ) -> RetrievalResult<Vec<ScoredUnit>> {
        let retriever = match source {
            RetrievalSource::Dense => &self.dense,
            RetrievalSource::Lexical => &self.lexical,
        };
        match result {
            Ok(mut units) => {
                if units.len() > k {
                    debug!(
                        "{} retriever returned {} units for k={k}; truncating",
                        retriever.name(),
                        units.len()
                    );
                    units.truncate(k);
                }
                Ok(units)
            }
            Err(err) => Err(match err {
                RetrievalError::RetrieverUnavailable { .. } => err,
                other => RetrievalError::RetrieverUnavailable {
                    retriever: source,
                    reason: format!("{}: {other}", retriever.name()),
                },
            }),
        }
    }

    fn on_failure(
        &self,
        failed: RetrievalSource,
        err: &RetrievalError,
    ) -> RetrievalResult<PartialRetrieverFailure> {
        match self.config.failure_policy {
            FailurePolicy::FailClosed => {
                warn!("{failed} retriever failed, failing closed: {err}");
                Err(RetrievalError::RetrieverUnavailable {
                    retriever: failed,
                    reason: err.to_string(),
                })
            }
            FailurePolicy::FailOpen => {
                warn!("{failed} retriever failed, returning partial results: {err}");
                Ok(PartialRetrieverFailure {
                    failed,
                    reason: err.to_string(),
                })
            }
        }
    }

    fn merge(&self, dense: Vec<ScoredUnit>, lexical: Vec<ScoredUnit>) -> MergeOutcome {
        let check = self.config.check_integrity;
        match self.config.merge {
            MergeStrategy::DenseFirst => merge_dense_first(dense, lexical, check),
            MergeStrategy::ReciprocalRank {
                k,
                dense_weight,
                lexical_weight,
            } => merge_reciprocal_rank(dense, lexical, k, dense_weight, lexical_weight, check),
        }
    }
}
