//! Candidate types produced by retrievers and the hybrid merge.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rag::core::ids::UnitId;
use crate::rag::core::metadata::UnitMetadata;
use crate::rag::core::unit::RetrievableUnit;

/// Which retriever contributed a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalSource {
    /// Embedding similarity against the vector index.
    Dense,
    /// Term-weighted scoring against the inverted index.
    Lexical,
}

impl RetrievalSource {
    /// Lowercase tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Lexical => "lexical",
        }
    }
}

impl fmt::Display for RetrievalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit returned by a single retriever, best match first.
#[derive(Clone, Debug)]
pub struct ScoredUnit {
    /// Shared, read-only unit.
    pub unit: Arc<RetrievableUnit>,
    /// Retriever-specific relevance score, if it produces one.
    pub score: Option<f64>,
}

impl ScoredUnit {
    /// Pair a unit with a score.
    #[must_use]
    pub const fn new(unit: Arc<RetrievableUnit>, score: Option<f64>) -> Self {
        Self { unit, score }
    }
}

/// A unit tagged with the retriever that contributed it.
#[derive(Clone, Debug)]
pub struct ScoredCandidate {
    /// Shared, read-only unit.
    pub unit: Arc<RetrievableUnit>,
    /// Contributing retriever.
    pub source: RetrievalSource,
    /// Score reported by the contributing retriever.
    pub score: Option<f64>,
}

impl ScoredCandidate {
    /// Tag a retriever result with its source.
    #[must_use]
    pub fn from_scored(scored: ScoredUnit, source: RetrievalSource) -> Self {
        Self {
            unit: scored.unit,
            source,
            score: scored.score,
        }
    }

    /// Unit identifier.
    #[must_use]
    pub fn id(&self) -> &UnitId {
        &self.unit.id
    }

    /// Unit text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.unit.text
    }

    /// Unit metadata, untouched by the merge.
    #[must_use]
    pub fn metadata(&self) -> &UnitMetadata {
        &self.unit.metadata
    }

    /// Owned, serializable view of the candidate.
    #[must_use]
    pub fn summary(&self) -> CandidateSummary {
        CandidateSummary {
            id: self.unit.id.clone(),
            source: self.source,
            score: self.score,
            file_name: self.unit.citation().map(str::to_string),
            text: self.unit.text.clone(),
        }
    }
}

/// Serializable view of a candidate, as returned by the API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    /// Unit id.
    pub id: UnitId,
    /// Contributing retriever.
    pub source: RetrievalSource,
    /// Contributing retriever's score.
    pub score: Option<f64>,
    /// Source document.
    pub file_name: Option<String>,
    /// Unit text.
    pub text: String,
}

/// Ordered candidates, unique by unit id.
///
/// Insertion order is preserved and the first occurrence of an id wins;
/// later inserts with a known id are rejected.
#[derive(Clone, Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<ScoredCandidate>,
    positions: HashMap<UnitId, usize>,
}

impl CandidateSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set with room for `capacity` candidates.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            candidates: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Append a candidate unless its id is already present.
    ///
    /// Returns `true` if the candidate was inserted.
    pub fn insert(&mut self, candidate: ScoredCandidate) -> bool {
        if self.positions.contains_key(candidate.id()) {
            return false;
        }
        self.positions
            .insert(candidate.id().clone(), self.candidates.len());
        self.candidates.push(candidate);
        true
    }

    /// Whether a unit with this id is present.
    #[must_use]
    pub fn contains(&self, id: &UnitId) -> bool {
        self.positions.contains_key(id)
    }

    /// Look up a candidate by id.
    #[must_use]
    pub fn get(&self, id: &UnitId) -> Option<&ScoredCandidate> {
        self.positions.get(id).map(|&pos| &self.candidates[pos])
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Iterate candidates in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredCandidate> {
        self.candidates.iter()
    }

    /// Candidate ids in order.
    #[must_use]
    pub fn ids(&self) -> Vec<&UnitId> {
        self.candidates.iter().map(ScoredCandidate::id).collect()
    }

    /// Borrow the ordered candidates.
    #[must_use]
    pub fn as_slice(&self) -> &[ScoredCandidate] {
        &self.candidates
    }

    /// Consume the set into its ordered candidates.
    #[must_use]
    pub fn into_vec(self) -> Vec<ScoredCandidate> {
        self.candidates
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a ScoredCandidate;
    type IntoIter = std::slice::Iter<'a, ScoredCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

impl IntoIterator for CandidateSet {
    type Item = ScoredCandidate;
    type IntoIter = std::vec::IntoIter<ScoredCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}
