//! Write side of a dense index.

use std::future::Future;
use std::pin::Pin;

use rig::embeddings::Embedding;

use crate::rag::core::errors::RetrievalResult;
use crate::rag::core::unit::RetrievableUnit;

/// Boxed future type for dense index writes.
pub type SinkFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Destination for embedded units produced at ingestion.
pub trait DenseSink: Send + Sync {
    /// Insert or replace units with their embeddings, keyed by unit id.
    ///
    /// Returns the number of units written.
    ///
    /// # Errors
    /// Returns an error if the index cannot persist the batch.
    fn upsert(
        &self,
        batch: Vec<(RetrievableUnit, Embedding)>,
    ) -> SinkFuture<'_, RetrievalResult<usize>>;

    /// Remove every unit this sink holds for its collection.
    ///
    /// Returns the number of units removed.
    ///
    /// # Errors
    /// Returns an error if the index cannot be modified.
    fn clear(&self) -> SinkFuture<'_, RetrievalResult<usize>>;
}
