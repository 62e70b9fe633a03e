//! Retrievable unit model.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::rag::core::errors::{RetrievalError, RetrievalResult};
use crate::rag::core::ids::UnitId;
use crate::rag::core::metadata::UnitMetadata;

/// One immutable chunk of source text.
///
/// Identity is by `id` only: two units with the same id are the same unit
/// even if the indexing paths that produced them disagree on content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievableUnit {
    /// Stable unique identifier.
    pub id: UnitId,
    /// Chunk content.
    pub text: String,
    /// Citation and context metadata.
    #[serde(default)]
    pub metadata: UnitMetadata,
}

impl RetrievableUnit {
    /// Create a unit without metadata.
    #[must_use]
    pub fn new(id: impl Into<UnitId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: UnitMetadata::new(),
        }
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: UnitMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Document name to cite for this unit, if known.
    #[must_use]
    pub fn citation(&self) -> Option<&str> {
        self.metadata.file_name()
    }

    /// Stable hash of the normalized text, used for integrity checks.
    #[must_use]
    pub fn content_hash(&self) -> String {
        hash_content(&self.text)
    }

    /// Validate the unit before it is indexed.
    ///
    /// # Errors
    /// Returns an error if the id or the text is blank.
    pub fn validate(&self) -> RetrievalResult<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(RetrievalError::InvalidUnit("id is empty".to_string()));
        }
        if self.text.trim().is_empty() {
            return Err(RetrievalError::InvalidUnit(format!(
                "unit {} has empty text",
                self.id
            )));
        }
        Ok(())
    }
}

/// Normalize text for hashing (trim, lowercase, collapse whitespace).
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut prev_space = false;

    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            if !prev_space {
                normalized.push(' ');
                prev_space = true;
            }
        } else {
            normalized.extend(ch.to_lowercase());
            prev_space = false;
        }
    }

    normalized
}

/// Compute a stable hash of normalized content.
#[must_use]
pub fn hash_content(text: &str) -> String {
    let mut hasher = DefaultHasher::new();
    normalize_text(text).hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
