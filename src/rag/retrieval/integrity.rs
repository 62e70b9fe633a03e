//! Cross-index consistency checks.
//!
//! Deduplication assumes both indexes share one id namespace. When a unit id
//! is surfaced by both retrievers with different content, the first-seen
//! entry still wins and the mismatch is reported alongside the candidates.

use serde::Serialize;

use crate::rag::core::ids::UnitId;
use crate::rag::core::unit::RetrievableUnit;

/// What differs between two units sharing an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InconsistencyKind {
    /// Normalized text differs.
    Text,
    /// Metadata differs.
    Metadata,
    /// Both text and metadata differ.
    TextAndMetadata,
}

/// A unit id mapped to materially different content in the two indexes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IndexInconsistency {
    /// Shared id.
    pub id: UnitId,
    /// What differs.
    pub kind: InconsistencyKind,
    /// Content hash of the retained (first-seen) unit.
    pub kept_hash: String,
    /// Content hash of the discarded unit.
    pub discarded_hash: String,
}

/// Compare the retained unit with a later duplicate.
#[must_use]
pub fn compare_units(kept: &RetrievableUnit, discarded: &RetrievableUnit) -> Option<IndexInconsistency> {
    let kept_hash = kept.content_hash();
    let discarded_hash = discarded.content_hash();
    let text_differs = kept_hash != discarded_hash;
    let metadata_differs = kept.metadata != discarded.metadata;

    let kind = match (text_differs, metadata_differs) {
        (false, false) => return None,
        (true, false) => InconsistencyKind::Text,
        (false, true) => InconsistencyKind::Metadata,
        (true, true) => InconsistencyKind::TextAndMetadata,
    };

    Some(IndexInconsistency {
        id: kept.id.clone(),
        kind,
        kept_hash,
        discarded_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::core::metadata::UnitMetadata;

    #[test]
    fn identical_units_are_consistent() {
        let a = RetrievableUnit::new("u1", "Revenue grew");
        let b = RetrievableUnit::new("u1", "revenue  grew");
        assert_eq!(compare_units(&a, &b), None);
    }

    #[test]
    fn reports_text_and_metadata_differences() {
        let a = RetrievableUnit::new("u1", "Revenue grew");
        let b = RetrievableUnit::new("u1", "Revenue fell");
        assert_eq!(compare_units(&a, &b).unwrap().kind, InconsistencyKind::Text);

        let c = RetrievableUnit::new("u1", "Revenue grew")
            .with_metadata(UnitMetadata::new().with("file_name", "intc.pdf"));
        assert_eq!(compare_units(&a, &c).unwrap().kind, InconsistencyKind::Metadata);

        let d = RetrievableUnit::new("u1", "Other")
            .with_metadata(UnitMetadata::new().with("file_name", "intc.pdf"));
        let report = compare_units(&a, &d).unwrap();
        assert_eq!(report.kind, InconsistencyKind::TextAndMetadata);
        assert_eq!(report.kept_hash, a.content_hash());
    }
}
