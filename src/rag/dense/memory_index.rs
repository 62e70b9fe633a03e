//! In-process dense index with brute-force cosine search.

use std::sync::Arc;

use rig::embeddings::Embedding;
use tokio::sync::RwLock;
use tracing::debug;

use crate::rag::core::errors::{RetrievalError, RetrievalResult};
use crate::rag::core::unit::RetrievableUnit;
use crate::rag::dense::embedder::Embedder;
use crate::rag::dense::sink::{DenseSink, SinkFuture};
use crate::rag::retrieval::candidate::ScoredUnit;
use crate::rag::retrieval::retriever::{RetrieveFuture, Retriever};

/// Cosine similarity; `0.0` for mismatched lengths or zero vectors.
#[must_use]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

struct DenseEntry {
    unit: Arc<RetrievableUnit>,
    vector: Vec<f64>,
}

/// Dense index kept in memory.
pub struct InMemoryDenseIndex {
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<DenseEntry>>,
    min_similarity: f64,
}

impl InMemoryDenseIndex {
    /// Create an empty index using `embedder` for queries.
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>, min_similarity: f64) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
            min_similarity,
        }
    }

    /// Number of indexed units.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no unit is indexed.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Embed and index `units`.
    ///
    /// # Errors
    /// Returns an error if embedding fails or a unit is invalid.
    pub async fn index_units(&self, units: Vec<RetrievableUnit>) -> RetrievalResult<usize> {
        let texts = units.iter().map(|u| u.text.clone()).collect();
        let embeddings = self.embedder.embed_texts(texts).await?;
        if embeddings.len() != units.len() {
            return Err(RetrievalError::InvalidUnit(format!(
                "embedder returned {} vectors for {} units",
                embeddings.len(),
                units.len()
            )));
        }
        self.upsert(units.into_iter().zip(embeddings).collect()).await
    }

    async fn search(&self, query: &str, k: usize) -> RetrievalResult<Vec<ScoredUnit>> {
        let query_vector = self.embedder.embed_text(query).await?.vec;
        let entries = self.entries.read().await;
        let mut scored: Vec<(usize, f64)> = entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, cosine_similarity(&query_vector, &entry.vector)))
            .filter(|(_, score)| *score >= self.min_similarity)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        debug!("Dense search returned {} of {} units", scored.len(), entries.len());
        Ok(scored
            .into_iter()
            .map(|(pos, score)| ScoredUnit::new(Arc::clone(&entries[pos].unit), Some(score)))
            .collect())
    }
}

impl DenseSink for InMemoryDenseIndex {
    fn upsert(
        &self,
        batch: Vec<(RetrievableUnit, Embedding)>,
    ) -> SinkFuture<'_, RetrievalResult<usize>> {
        Box::pin(async move {
            let mut entries = self.entries.write().await;
            let mut written = 0;
            for (unit, embedding) in batch {
                unit.validate()?;
                let entry = DenseEntry {
                    unit: Arc::new(unit),
                    vector: embedding.vec,
                };
                match entries.iter_mut().find(|e| e.unit.id == entry.unit.id) {
                    Some(existing) => *existing = entry,
                    None => entries.push(entry),
                }
                written += 1;
            }
            Ok(written)
        })
    }

    fn clear(&self) -> SinkFuture<'_, RetrievalResult<usize>> {
        Box::pin(async move {
            let mut entries = self.entries.write().await;
            let removed = entries.len();
            entries.clear();
            Ok(removed)
        })
    }
}

impl Retriever for InMemoryDenseIndex {
    fn name(&self) -> &'static str {
        "dense-memory"
    }

    fn retrieve(&self, query: &str, k: usize) -> RetrieveFuture<'_, RetrievalResult<Vec<ScoredUnit>>> {
        let query = query.to_string();
        Box::pin(async move { self.search(&query, k).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::test_support::HashingEmbedder;

    fn index() -> InMemoryDenseIndex {
        InMemoryDenseIndex::new(Arc::new(HashingEmbedder::new(64)), 0.0)
    }

    #[test]
    fn cosine_handles_degenerate_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < f64::EPSILON);
        assert!(cosine_similarity(&[1.0], &[1.0, 1.0]).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn finds_most_similar_unit_first() {
        let index = index();
        index
            .index_units(vec![
                RetrievableUnit::new("u1", "goodwill impairment charges"),
                RetrievableUnit::new("u2", "foundry capacity expansion in Ohio"),
            ])
            .await
            .unwrap();

        let results = index.retrieve("foundry capacity", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].unit.id.as_str(), "u2");
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let index = index();
        index
            .index_units(vec![RetrievableUnit::new("u1", "old text")])
            .await
            .unwrap();
        index
            .index_units(vec![RetrievableUnit::new("u1", "new text")])
            .await
            .unwrap();
        assert_eq!(index.len().await, 1);
        let results = index.retrieve("new text", 5).await.unwrap();
        assert_eq!(results[0].unit.text, "new text");
    }

    #[tokio::test]
    async fn clear_drops_all_entries() {
        let index = index();
        index
            .index_units(vec![
                RetrievableUnit::new("u1", "cash flow"),
                RetrievableUnit::new("u2", "share buybacks"),
            ])
            .await
            .unwrap();
        assert_eq!(index.clear().await.unwrap(), 2);
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn empty_index_returns_nothing() {
        let index = index();
        assert!(index.is_empty().await);
        assert!(index.retrieve("anything", 5).await.unwrap().is_empty());
    }
}
