//! JSON persistence of ingested units.
//!
//! The lexical index has no storage of its own; it is rebuilt from this file
//! at startup. The file also records the collection the units belong to.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::rag::core::errors::{RetrievalError, RetrievalResult};
use crate::rag::core::unit::RetrievableUnit;

#[derive(Serialize, Deserialize)]
struct UnitStoreFile {
    collection: String,
    created_at: DateTime<Utc>,
    units: Vec<RetrievableUnit>,
}

/// Unit list stored as a JSON file.
#[derive(Clone, Debug)]
pub struct UnitStore {
    path: PathBuf,
    collection: String,
}

impl UnitStore {
    /// Store at `path` for `collection`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, collection: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            collection: collection.into(),
        }
    }

    /// File location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stored units.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, units: &[RetrievableUnit]) -> RetrievalResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let file = UnitStoreFile {
            collection: self.collection.clone(),
            created_at: Utc::now(),
            units: units.to_vec(),
        };
        let json = serde_json::to_vec(&file)?;
        tokio::fs::write(&self.path, json).await?;
        info!("Saved {} units to {}", units.len(), self.path.display());
        Ok(())
    }

    /// Load the stored units.
    ///
    /// # Errors
    /// Returns an error if the file is missing, malformed, or belongs to a
    /// different collection.
    pub async fn load(&self) -> RetrievalResult<Vec<RetrievableUnit>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let file: UnitStoreFile = serde_json::from_slice(&bytes)?;
        if file.collection != self.collection {
            return Err(RetrievalError::InvalidConfig(format!(
                "unit store {} holds collection `{}`, expected `{}`",
                self.path.display(),
                file.collection,
                self.collection
            )));
        }
        info!(
            "Loaded {} units from {} (ingested {})",
            file.units.len(),
            self.path.display(),
            file.created_at
        );
        Ok(file.units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::core::metadata::UnitMetadata;

    #[tokio::test]
    async fn save_then_load_preserves_units() {
        let dir = tempfile::tempdir().unwrap();
        let store = UnitStore::new(dir.path().join("storage/nodes.json"), "financial_10k");
        let units = vec![
            RetrievableUnit::new("a.pdf#000000", "First.")
                .with_metadata(UnitMetadata::new().with("file_name", "a.pdf")),
            RetrievableUnit::new("a.pdf#000001", "Second."),
        ];
        store.save(&units).await.unwrap();
        assert_eq!(store.load().await.unwrap(), units);
    }

    #[tokio::test]
    async fn rejects_other_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.json");
        UnitStore::new(&path, "one").save(&[]).await.unwrap();
        assert!(matches!(
            UnitStore::new(&path, "two").load().await,
            Err(RetrievalError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = UnitStore::new(dir.path().join("absent.json"), "c");
        assert!(matches!(store.load().await, Err(RetrievalError::Io(_))));
        assert!(store.path().ends_with("absent.json"));
    }
}
