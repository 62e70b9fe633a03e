//! Persistent dense index on `SQLite` with sqlite-vec, through rig-sqlite.
//!
//! Every row carries the collection name it was ingested under; searches are
//! filtered to the configured collection.

use std::sync::{Arc, OnceLock};

use rig::OneOrMany;
use rig::embeddings::Embedding;
use rig::vector_store::VectorStoreIndex;
use rig::vector_store::request::{SearchFilter, VectorSearchRequest};
use rig_sqlite::{
    Column, ColumnValue, SqliteSearchFilter, SqliteVectorIndex, SqliteVectorStore,
    SqliteVectorStoreTable,
};
use serde::Deserialize;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::rag::core::config::RagConfig;
use crate::rag::core::errors::{RetrievalError, RetrievalResult};
use crate::rag::core::ids::UnitId;
use crate::rag::core::metadata::UnitMetadata;
use crate::rag::core::unit::RetrievableUnit;
use crate::rag::dense::embedder::{OllamaEmbeddingModel, ollama_embedding_model};
use crate::rag::dense::sink::{DenseSink, SinkFuture};
use crate::rag::dense::sqlite_vec_loader::register_sqlite_vec;
use crate::rag::retrieval::candidate::ScoredUnit;
use crate::rag::retrieval::retriever::{RetrieveFuture, Retriever};

const DEFAULT_TABLE: &str = "financial_10k";
static TABLE_NAME: OnceLock<&'static str> = OnceLock::new();

/// rig-sqlite reads the table name from a static; it is fixed on first open.
fn init_table_name(name: &str) -> RetrievalResult<()> {
    if let Some(existing) = TABLE_NAME.get() {
        if *existing == name {
            return Ok(());
        }
        return Err(RetrievalError::InvalidConfig(format!(
            "dense table already opened as `{existing}`, cannot switch to `{name}`"
        )));
    }
    let leaked: &'static str = Box::leak(name.to_string().into_boxed_str());
    let _ = TABLE_NAME.set(leaked);
    Ok(())
}

fn table_name() -> &'static str {
    TABLE_NAME.get().copied().unwrap_or(DEFAULT_TABLE)
}

#[derive(Clone, Debug, Deserialize)]
struct UnitRow {
    id: String,
    collection: String,
    text: String,
    metadata_json: String,
    content_hash: String,
}

impl UnitRow {
    fn from_unit(unit: &RetrievableUnit, collection: &str) -> RetrievalResult<Self> {
        Ok(Self {
            id: unit.id.to_string(),
            collection: collection.to_string(),
            text: unit.text.clone(),
            metadata_json: serde_json::to_string(&unit.metadata)?,
            content_hash: unit.content_hash(),
        })
    }

    /// The stored id is taken verbatim; ids are opaque and never normalized.
    fn into_unit(self) -> RetrievalResult<RetrievableUnit> {
        let id = UnitId::new(self.id);
        let metadata: UnitMetadata = serde_json::from_str(&self.metadata_json)?;
        Ok(RetrievableUnit::new(id, self.text).with_metadata(metadata))
    }
}

impl SqliteVectorStoreTable for UnitRow {
    fn name() -> &'static str {
        table_name()
    }

    fn schema() -> Vec<Column> {
        vec![
            Column::new("id", "TEXT PRIMARY KEY"),
            Column::new("collection", "TEXT").indexed(),
            Column::new("text", "TEXT"),
            Column::new("metadata_json", "TEXT"),
            Column::new("content_hash", "TEXT"),
        ]
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn column_values(&self) -> Vec<(&'static str, Box<dyn ColumnValue>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("collection", Box::new(self.collection.clone())),
            ("text", Box::new(self.text.clone())),
            ("metadata_json", Box::new(self.metadata_json.clone())),
            ("content_hash", Box::new(self.content_hash.clone())),
        ]
    }
}

/// Dense retriever and sink over a sqlite-vec table.
pub struct SqliteDenseIndex {
    conn: Connection,
    store: SqliteVectorStore<OllamaEmbeddingModel, UnitRow>,
    index: SqliteVectorIndex<OllamaEmbeddingModel, UnitRow>,
    collection: String,
    min_similarity: f64,
}

impl SqliteDenseIndex {
    /// Open (or create) the dense index described by `config`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or the table name
    /// conflicts with one already opened in this process.
    pub async fn open(config: &RagConfig) -> RetrievalResult<Self> {
        register_sqlite_vec();
        init_table_name(&config.storage.table)?;

        if let Some(parent) = config.storage.sqlite_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let conn = Connection::open(&config.storage.sqlite_path).await?;

        let model = ollama_embedding_model(&config.embedding)?;
        let store = SqliteVectorStore::new(conn.clone(), &model).await?;
        let index = store.clone().index(model);

        info!(
            "Dense index opened at {} (table {}, collection {})",
            config.storage.sqlite_path.display(),
            table_name(),
            config.storage.collection
        );

        Ok(Self {
            conn,
            store,
            index,
            collection: config.storage.collection.clone(),
            min_similarity: config.embedding.min_similarity,
        })
    }

    /// Number of units stored in this collection.
    ///
    /// # Errors
    /// Returns an error if the table cannot be queried.
    pub async fn count(&self) -> RetrievalResult<usize> {
        let table = table_name().to_string();
        let collection = self.collection.clone();
        let count = self
            .conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare(&format!("SELECT COUNT(*) FROM {table} WHERE collection = ?1"))?;
                let count: i64 = stmt.query_row(rusqlite::params![collection], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn delete_ids(&self, ids: Vec<String>) -> RetrievalResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let table = table_name().to_string();
        self.conn
            .call(move |conn| {
                let placeholders = (1..=ids.len())
                    .map(|i| format!("?{i}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let tx = conn.transaction()?;
                let rowids = {
                    let mut stmt = tx.prepare(&format!(
                        "SELECT rowid FROM {table} WHERE id IN ({placeholders})"
                    ))?;
                    stmt.query_map(rusqlite::params_from_iter(ids.iter()), |row| {
                        row.get::<_, i64>(0)
                    })?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?
                };
                if !rowids.is_empty() {
                    let rowid_placeholders = (1..=rowids.len())
                        .map(|i| format!("?{i}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    tx.execute(
                        &format!(
                            "DELETE FROM {table}_embeddings WHERE rowid IN ({rowid_placeholders})"
                        ),
                        rusqlite::params_from_iter(rowids.iter()),
                    )?;
                    tx.execute(
                        &format!("DELETE FROM {table} WHERE id IN ({placeholders})"),
                        rusqlite::params_from_iter(ids.iter()),
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Remove every row of this collection from both the row table and the
    /// embeddings table. Returns the number of units removed.
    async fn clear_collection(&self) -> RetrievalResult<usize> {
        let table = table_name().to_string();
        let collection = self.collection.clone();
        let removed = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let rowids = {
                    let mut stmt =
                        tx.prepare(&format!("SELECT rowid FROM {table} WHERE collection = ?1"))?;
                    stmt.query_map(rusqlite::params![collection], |row| row.get::<_, i64>(0))?
                        .collect::<Result<Vec<_>, rusqlite::Error>>()?
                };
                {
                    let mut delete_embedding =
                        tx.prepare(&format!("DELETE FROM {table}_embeddings WHERE rowid = ?1"))?;
                    for rowid in &rowids {
                        delete_embedding.execute(rusqlite::params![rowid])?;
                    }
                }
                tx.execute(
                    &format!("DELETE FROM {table} WHERE collection = ?1"),
                    rusqlite::params![collection],
                )?;
                tx.commit()?;
                Ok(rowids.len())
            })
            .await?;
        Ok(removed)
    }

    async fn search(&self, query: String, k: usize) -> RetrievalResult<Vec<ScoredUnit>> {
        let filter = SqliteSearchFilter::eq("collection".to_string(), self.collection.clone().into());
        let request = VectorSearchRequest::builder()
            .query(query)
            .samples(k as u64)
            .threshold(self.min_similarity)
            .filter(filter)
            .build()
            .map_err(|err| RetrievalError::InvalidConfig(err.to_string()))?;

        let raw = self.index.top_n::<UnitRow>(request).await?;
        let mut results = Vec::with_capacity(raw.len());
        for (score, _id, row) in raw {
            if score < self.min_similarity {
                continue;
            }
            results.push(ScoredUnit::new(Arc::new(row.into_unit()?), Some(score)));
        }
        results.truncate(k);
        debug!("sqlite-vec returned {} units for k={k}", results.len());
        Ok(results)
    }
}

impl DenseSink for SqliteDenseIndex {
    fn upsert(
        &self,
        batch: Vec<(RetrievableUnit, Embedding)>,
    ) -> SinkFuture<'_, RetrievalResult<usize>> {
        Box::pin(async move {
            if batch.is_empty() {
                return Ok(0);
            }
            let mut rows = Vec::with_capacity(batch.len());
            for (unit, embedding) in &batch {
                unit.validate()?;
                rows.push((
                    UnitRow::from_unit(unit, &self.collection)?,
                    OneOrMany::one(embedding.clone()),
                ));
            }
            self.delete_ids(rows.iter().map(|(row, _)| row.id.clone()).collect())
                .await?;
            let written = rows.len();
            self.store.add_rows(rows).await?;
            Ok(written)
        })
    }

    fn clear(&self) -> SinkFuture<'_, RetrievalResult<usize>> {
        Box::pin(async move {
            let removed = self.clear_collection().await?;
            info!("Cleared {removed} units from collection {}", self.collection);
            Ok(removed)
        })
    }
}

impl Retriever for SqliteDenseIndex {
    fn name(&self) -> &'static str {
        "dense-sqlite"
    }

    fn retrieve(&self, query: &str, k: usize) -> RetrieveFuture<'_, RetrievalResult<Vec<ScoredUnit>>> {
        let query = query.to_string();
        Box::pin(async move { self.search(query, k).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_round_trips_unit_fields() {
        let unit = RetrievableUnit::new("intc.pdf#000004", "Revenue declined 14%")
            .with_metadata(UnitMetadata::new().with("file_name", "intc.pdf"));
        let row = UnitRow::from_unit(&unit, "financial_10k").unwrap();
        assert_eq!(row.collection, "financial_10k");
        assert_eq!(row.content_hash, unit.content_hash());
        assert_eq!(row.id(), "intc.pdf#000004");
        assert_eq!(row.into_unit().unwrap(), unit);
    }

    #[test]
    fn stored_ids_are_not_normalized() {
        let id = UnitId::for_chunk(" q3 report.pdf", 0);
        let unit = RetrievableUnit::new(id.clone(), "Gross margin 41%");
        let row = UnitRow::from_unit(&unit, "financial_10k").unwrap();
        let restored = row.into_unit().unwrap();
        assert_eq!(restored.id, id);
        assert_eq!(restored.id.as_str(), " q3 report.pdf#000000");
    }

    fn test_config(dir: &std::path::Path) -> RagConfig {
        let mut config = RagConfig::default();
        config.storage.sqlite_path = dir.join("dense.db");
        config.storage.table = DEFAULT_TABLE.to_string();
        config.embedding.ndims = 4;
        config
    }

    fn embedded(id: &str, seed: f64) -> (RetrievableUnit, Embedding) {
        let text = format!("unit {id}");
        let embedding = Embedding {
            document: text.clone(),
            vec: vec![seed, 1.0, 0.5, 0.25],
        };
        (RetrievableUnit::new(id, text), embedding)
    }

    #[tokio::test]
    async fn clear_then_upsert_leaves_only_new_units() {
        let dir = tempfile::tempdir().unwrap();
        let index = SqliteDenseIndex::open(&test_config(dir.path())).await.unwrap();

        index
            .upsert(vec![embedded("a#0", 0.1), embedded("a#1", 0.2), embedded("a#2", 0.3)])
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 3);

        assert_eq!(index.clear().await.unwrap(), 3);
        index
            .upsert(vec![embedded("a#0", 0.4), embedded("a#1", 0.5)])
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 2);

        let embeddings: i64 = index
            .conn
            .call(|conn| {
                let count = conn.query_row(
                    &format!("SELECT COUNT(*) FROM {DEFAULT_TABLE}_embeddings"),
                    [],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
            .unwrap();
        assert_eq!(embeddings, 2);
    }

    #[tokio::test]
    async fn upserting_same_ids_does_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let index = SqliteDenseIndex::open(&test_config(dir.path())).await.unwrap();

        index.upsert(vec![embedded("b#0", 0.1)]).await.unwrap();
        index.upsert(vec![embedded("b#0", 0.9)]).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
    }
}
