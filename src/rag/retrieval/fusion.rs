//! Merge policies combining dense and lexical result lists.
//!
//! Both policies keep the candidate set unique by id and keep the dense entry
//! (unit, source tag, score) for ids surfaced by both retrievers.

use std::collections::HashMap;

use crate::rag::core::ids::UnitId;
use crate::rag::retrieval::candidate::{CandidateSet, RetrievalSource, ScoredCandidate, ScoredUnit};
use crate::rag::retrieval::integrity::{IndexInconsistency, compare_units};

/// Result of merging two ranked lists.
#[derive(Clone, Debug, Default)]
pub struct MergeOutcome {
    /// Deduplicated candidates.
    pub candidates: CandidateSet,
    /// Shared ids whose content differs between the two lists.
    pub inconsistencies: Vec<IndexInconsistency>,
}

/// Dense results in dense order, then lexical-only results in lexical order.
///
/// No re-scoring happens: this is rank-preserving concatenation with
/// first-occurrence deduplication.
#[must_use]
pub fn merge_dense_first(
    dense: Vec<ScoredUnit>,
    lexical: Vec<ScoredUnit>,
    check_integrity: bool,
) -> MergeOutcome {
    let mut outcome = MergeOutcome {
        candidates: CandidateSet::with_capacity(dense.len() + lexical.len()),
        inconsistencies: Vec::new(),
    };

    for scored in dense {
        outcome.insert(scored, RetrievalSource::Dense, check_integrity);
    }
    for scored in lexical {
        outcome.insert(scored, RetrievalSource::Lexical, check_integrity);
    }

    outcome
}

/// Weighted reciprocal rank fusion.
///
/// `score(id) = Σ weight / (k + rank)` over the lists containing `id`, ranks
/// starting at 1. Candidates are ordered by fused score, ties keeping the
/// dense-first order.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Rank values are small, precision loss is acceptable
pub fn merge_reciprocal_rank(
    dense: Vec<ScoredUnit>,
    lexical: Vec<ScoredUnit>,
    k: f64,
    dense_weight: f64,
    lexical_weight: f64,
    check_integrity: bool,
) -> MergeOutcome {
    let mut fused: HashMap<UnitId, f64> = HashMap::new();
    for (weight, list) in [(dense_weight, &dense), (lexical_weight, &lexical)] {
        let mut counted: Vec<&UnitId> = Vec::with_capacity(list.len());
        for (rank, scored) in list.iter().enumerate() {
            let id = &scored.unit.id;
            if counted.contains(&id) {
                continue;
            }
            counted.push(id);
            *fused.entry(id.clone()).or_insert(0.0) += weight / (k + (rank + 1) as f64);
        }
    }

    let ordered = merge_dense_first(dense, lexical, check_integrity);
    let mut ranked: Vec<(f64, ScoredCandidate)> = ordered
        .candidates
        .into_iter()
        .map(|candidate| {
            let score = fused.get(candidate.id()).copied().unwrap_or(0.0);
            (score, candidate)
        })
        .collect();

    // Stable sort keeps the dense-first order among equal fused scores.
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut candidates = CandidateSet::with_capacity(ranked.len());
    for (_, candidate) in ranked {
        candidates.insert(candidate);
    }

    MergeOutcome {
        candidates,
        inconsistencies: ordered.inconsistencies,
    }
}

impl MergeOutcome {
    /// Integrity is only checked across retrievers. A repeat inside one
    /// list is a plain duplicate and is dropped silently.
    fn insert(&mut self, scored: ScoredUnit, source: RetrievalSource, check_integrity: bool) {
        if let Some(kept) = self.candidates.get(&scored.unit.id) {
            if check_integrity && kept.source != source {
                if let Some(report) = compare_units(&kept.unit, &scored.unit) {
                    tracing::warn!(
                        "Unit {} differs between retrievers ({:?}); keeping {} entry",
                        report.id,
                        report.kind,
                        kept.source
                    );
                    self.inconsistencies.push(report);
                }
            }
            return;
        }
        self.candidates
            .insert(ScoredCandidate::from_scored(scored, source));
    }
}
