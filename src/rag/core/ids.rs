//! Identifier types for retrievable units.
//!
//! Unit identifiers are opaque strings assigned once by the ingestion
//! pipeline. The dense index and the unit store backing the lexical index
//! both persist the same value, so an identifier names one chunk no matter
//! which retriever surfaced it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an empty or blank identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unit id must not be empty")]
pub struct UnitIdParseError;

/// Stable, opaque identifier of a retrievable unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    /// Wrap an existing identifier string.
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derive the identifier of the `ordinal`-th chunk of a document.
    ///
    /// Deterministic so that re-ingesting the same corpus reproduces the
    /// same identifiers in both indexes.
    #[must_use]
    pub fn for_chunk(document_id: &str, ordinal: usize) -> Self {
        Self(format!("{document_id}#{ordinal:06}"))
    }

    /// Borrow the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the underlying string.
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UnitId {
    type Err = UnitIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(UnitIdParseError);
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for UnitId {
    #[inline]
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UnitId {
    #[inline]
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for UnitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
