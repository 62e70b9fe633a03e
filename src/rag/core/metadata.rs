//! Metadata attached to retrievable units.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metadata key holding the originating document name.
pub const FILE_NAME_KEY: &str = "file_name";
/// Metadata key holding the surrounding sentence window.
pub const WINDOW_KEY: &str = "window";
/// Metadata key holding the unmodified sentence text.
pub const ORIGINAL_TEXT_KEY: &str = "original_text";
/// Metadata key holding the chunk ordinal inside its document.
pub const ORDINAL_KEY: &str = "ordinal";

/// A single metadata value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Free-form text.
    Text(String),
    /// Numeric value.
    Number(f64),
}

impl MetadataValue {
    /// Borrow the value as text, if it is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }

    /// Return the value as a number, if it is numeric.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for MetadataValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

/// Ordered string-keyed metadata map.
///
/// Keys are kept sorted so serialized output and equality checks are
/// independent of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitMetadata(BTreeMap<String, MetadataValue>);

impl UnitMetadata {
    /// Create an empty metadata map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    /// Look up a text value.
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetadataValue::as_text)
    }

    /// Originating document name, used for citations.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.get_text(FILE_NAME_KEY)
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip_keeps_value_kinds() {
        let meta = UnitMetadata::new()
            .with(FILE_NAME_KEY, "meta-10k.pdf")
            .with(ORDINAL_KEY, 12_u32);
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"file_name":"meta-10k.pdf","ordinal":12.0}"#);
        let back: UnitMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
        assert_eq!(back.file_name(), Some("meta-10k.pdf"));
        assert_eq!(back.get(ORDINAL_KEY).and_then(MetadataValue::as_number), Some(12.0));
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = UnitMetadata::new().with("a", "1").with("b", "2");
        let b = UnitMetadata::new().with("b", "2").with("a", "1");
        assert_eq!(a, b);
    }
}
