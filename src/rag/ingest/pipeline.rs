//! Ingestion pipeline: documents to units, units to both indexes.
//!
//! Units get their ids here, once. The same ids are written to the dense
//! index and to the unit store the lexical index is rebuilt from.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::rag::core::config::RagConfig;
use crate::rag::core::errors::{RetrievalError, RetrievalResult};
use crate::rag::core::unit::RetrievableUnit;
use crate::rag::dense::embedder::Embedder;
use crate::rag::dense::sink::DenseSink;
use crate::rag::ingest::documents::{SourceDocument, load_directory};
use crate::rag::ingest::sentence_window::SentenceWindowChunker;
use crate::rag::ingest::unit_store::UnitStore;

/// Summary of one ingestion run.
#[derive(Clone, Debug, Default)]
pub struct IngestionReport {
    /// Documents chunked.
    pub documents: usize,
    /// Units produced.
    pub units: usize,
    /// Units written to the dense index.
    pub embedded: usize,
    /// Files that could not be loaded.
    pub skipped: Vec<PathBuf>,
    /// Wall time.
    pub elapsed: Duration,
}

/// Chunks, embeds and stores documents.
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    sink: Arc<dyn DenseSink>,
    unit_store: UnitStore,
    chunker: SentenceWindowChunker,
    batch_size: usize,
}

impl IngestionPipeline {
    /// Create a pipeline.
    ///
    /// # Errors
    /// Returns an error if `batch_size` is zero.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        sink: Arc<dyn DenseSink>,
        unit_store: UnitStore,
        chunker: SentenceWindowChunker,
        batch_size: usize,
    ) -> RetrievalResult<Self> {
        if batch_size == 0 {
            return Err(RetrievalError::InvalidConfig(
                "embedding batch size must be > 0".to_string(),
            ));
        }
        Ok(Self {
            embedder,
            sink,
            unit_store,
            chunker,
            batch_size,
        })
    }

    /// Create a pipeline using the storage and chunking settings of `config`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn from_config(
        config: &RagConfig,
        embedder: Arc<dyn Embedder>,
        sink: Arc<dyn DenseSink>,
    ) -> RetrievalResult<Self> {
        config.validate()?;
        Self::new(
            embedder,
            sink,
            UnitStore::new(&config.storage.unit_store_path, &config.storage.collection),
            SentenceWindowChunker::new(config.chunking.window_size),
            config.embedding.batch_size,
        )
    }

    /// Ingest every supported file in `dir`.
    ///
    /// File reads and PDF extraction run on the blocking pool.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read or a store write fails.
    pub async fn run(&self, dir: &Path) -> RetrievalResult<IngestionReport> {
        let dir = dir.to_path_buf();
        let loaded = tokio::task::spawn_blocking(move || load_directory(&dir))
            .await
            .map_err(|err| RetrievalError::Io(std::io::Error::other(err)))??;
        let mut report = self.ingest_documents(&loaded.documents).await?;
        report.skipped = loaded.skipped;
        Ok(report)
    }

    /// Ingest already loaded documents, replacing the collection.
    ///
    /// Every batch is embedded before either store is touched. The dense
    /// collection is then cleared and rewritten, and the unit store is
    /// overwritten, so both indexes hold exactly this run's units.
    ///
    /// # Errors
    /// Returns an error if embedding or a store write fails.
    pub async fn ingest_documents(
        &self,
        documents: &[SourceDocument],
    ) -> RetrievalResult<IngestionReport> {
        let started = Instant::now();
        let units: Vec<RetrievableUnit> = documents
            .iter()
            .flat_map(|doc| self.chunker.chunk(doc))
            .collect();
        info!("Created {} units from {} documents", units.len(), documents.len());

        let mut batches = Vec::with_capacity(units.len().div_ceil(self.batch_size));
        for (batch_no, batch) in units.chunks(self.batch_size).enumerate() {
            let texts = batch.iter().map(|u| u.text.clone()).collect();
            let embeddings = self.embedder.embed_texts(texts).await?;
            if embeddings.len() != batch.len() {
                return Err(RetrievalError::InvalidUnit(format!(
                    "embedder returned {} vectors for {} units",
                    embeddings.len(),
                    batch.len()
                )));
            }
            debug!("Embedded batch {} of {} units", batch_no + 1, batch.len());
            batches.push(batch.iter().cloned().zip(embeddings).collect::<Vec<_>>());
        }

        let removed = self.sink.clear().await?;
        if removed > 0 {
            info!("Replacing {removed} previously ingested dense units");
        }

        let mut embedded = 0;
        for batch in batches {
            match self.sink.upsert(batch).await {
                Ok(written) => embedded += written,
                Err(err) => {
                    warn!("Dense write failed after {embedded} units, clearing collection: {err}");
                    if let Err(clear_err) = self.sink.clear().await {
                        warn!("Could not clear dense collection: {clear_err}");
                    }
                    return Err(err);
                }
            }
            info!("Wrote {embedded}/{} units to the dense index", units.len());
        }

        self.unit_store.save(&units).await?;

        let report = IngestionReport {
            documents: documents.len(),
            units: units.len(),
            embedded,
            skipped: Vec::new(),
            elapsed: started.elapsed(),
        };
        info!(
            "Ingestion complete: {} documents, {} units in {:?}",
            report.documents, report.units, report.elapsed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig::embeddings::Embedding;

    use crate::rag::core::config::Bm25Config;
    use crate::rag::dense::embedder::EmbedFuture;
    use crate::rag::dense::memory_index::InMemoryDenseIndex;
    use crate::rag::lexical::bm25::LexicalRetriever;
    use crate::rag::retrieval::retriever::Retriever;
    use crate::rag::test_support::HashingEmbedder;

    #[tokio::test]
    async fn both_indexes_share_unit_ids() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("10k");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(
            data.join("intc.txt"),
            "Intel revenue declined. Foundry losses widened. Gross margin fell.",
        )
        .unwrap();
        std::fs::write(data.join("amd.txt"), "AMD data center revenue grew.").unwrap();
        std::fs::write(data.join("logo.png"), [0_u8, 1, 2]).unwrap();

        let embedder = Arc::new(HashingEmbedder::new(32));
        let dense = Arc::new(InMemoryDenseIndex::new(embedder.clone(), 0.0));
        let store = UnitStore::new(dir.path().join("nodes.json"), "financial_10k");
        let pipeline = IngestionPipeline::new(
            embedder,
            dense.clone(),
            store.clone(),
            SentenceWindowChunker::new(3),
            2,
        )
        .unwrap();

        let report = pipeline.run(&data).await.unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.units, 4);
        assert_eq!(report.embedded, 4);
        assert!(report.skipped.is_empty());
        assert_eq!(dense.len().await, 4);

        let lexical = LexicalRetriever::from_units(store.load().await.unwrap(), Bm25Config::default())
            .unwrap();
        let from_lexical = lexical.retrieve("foundry losses", 1).await.unwrap();
        let from_dense = dense.retrieve("foundry losses widened", 1).await.unwrap();
        assert_eq!(from_lexical[0].unit.id, from_dense[0].unit.id);
        assert_eq!(from_lexical[0].unit.id.as_str(), "intc.txt#000001");
    }

    struct UnreachableEmbedder;

    impl Embedder for UnreachableEmbedder {
        fn embed_text(&self, _text: &str) -> EmbedFuture<'_, RetrievalResult<Embedding>> {
            Box::pin(async { Err(RetrievalError::Io(std::io::Error::other("embedder down"))) })
        }

        fn embed_texts(&self, _texts: Vec<String>) -> EmbedFuture<'_, RetrievalResult<Vec<Embedding>>> {
            Box::pin(async { Err(RetrievalError::Io(std::io::Error::other("embedder down"))) })
        }

        fn ndims(&self) -> usize {
            16
        }
    }

    fn write_doc(dir: &Path, name: &str, text: &str) {
        std::fs::write(dir.join(name), text).unwrap();
    }

    #[tokio::test]
    async fn reingest_replaces_previous_dense_units() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("10k");
        std::fs::create_dir_all(&data).unwrap();
        write_doc(&data, "intc.txt", "Intel revenue declined. Foundry losses widened. Gross margin fell.");
        write_doc(&data, "amd.txt", "AMD data center revenue grew.");

        let embedder = Arc::new(HashingEmbedder::new(32));
        let dense = Arc::new(InMemoryDenseIndex::new(embedder.clone(), 0.0));
        let store = UnitStore::new(dir.path().join("nodes.json"), "financial_10k");
        let pipeline = IngestionPipeline::new(
            embedder,
            dense.clone(),
            store.clone(),
            SentenceWindowChunker::new(3),
            2,
        )
        .unwrap();

        pipeline.run(&data).await.unwrap();
        assert_eq!(dense.len().await, 4);

        std::fs::remove_file(data.join("amd.txt")).unwrap();
        write_doc(&data, "intc.txt", "Intel revenue declined.");
        let report = pipeline.run(&data).await.unwrap();

        let stored = store.load().await.unwrap();
        assert_eq!(report.units, 1);
        assert_eq!(stored.len(), 1);
        assert_eq!(dense.len().await, stored.len());
        let hits = dense.retrieve("foundry losses widened", 5).await.unwrap();
        assert!(hits.iter().all(|hit| hit.unit.id.as_str() == "intc.txt#000000"));
    }

    #[tokio::test]
    async fn embedding_failure_leaves_stores_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(HashingEmbedder::new(16));
        let dense = Arc::new(InMemoryDenseIndex::new(embedder.clone(), 0.0));
        dense
            .index_units(vec![RetrievableUnit::new("old#000000", "prior filing")])
            .await
            .unwrap();

        let pipeline = IngestionPipeline::new(
            Arc::new(UnreachableEmbedder),
            dense.clone(),
            UnitStore::new(dir.path().join("nodes.json"), "financial_10k"),
            SentenceWindowChunker::new(3),
            2,
        )
        .unwrap();

        let docs = vec![SourceDocument {
            id: "new.txt".to_string(),
            text: "Fresh text. More text.".to_string(),
        }];
        assert!(pipeline.ingest_documents(&docs).await.is_err());
        assert_eq!(dense.len().await, 1);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let embedder = Arc::new(HashingEmbedder::new(8));
        let dense = Arc::new(InMemoryDenseIndex::new(embedder.clone(), 0.0));
        let result = IngestionPipeline::new(
            embedder,
            dense,
            UnitStore::new("unused.json", "c"),
            SentenceWindowChunker::new(3),
            0,
        );
        assert!(matches!(result, Err(RetrievalError::InvalidConfig(_))));
    }
}
