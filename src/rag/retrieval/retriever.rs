//! Retriever contract shared by dense and lexical strategies.

use std::future::Future;
use std::pin::Pin;

use crate::rag::core::errors::RetrievalResult;
use crate::rag::retrieval::candidate::ScoredUnit;

/// Boxed future type for retriever operations.
pub type RetrieveFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single retrieval strategy over the unit store.
///
/// Implementations must:
/// - return at most `k` units, best match first;
/// - return the same ordered list for the same query against an unchanged index;
/// - return an empty list, not an error, when nothing matches;
/// - use the unit ids assigned at ingestion, shared with every other retriever.
pub trait Retriever: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Retrieve up to `k` units for `query`.
    ///
    /// # Errors
    /// Returns an error if the backing index cannot be queried.
    fn retrieve(&self, query: &str, k: usize) -> RetrieveFuture<'_, RetrievalResult<Vec<ScoredUnit>>>;
}
