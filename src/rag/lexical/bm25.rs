//! BM25 Okapi lexical retriever.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::rag::core::config::Bm25Config;
use crate::rag::core::errors::{RetrievalError, RetrievalResult};
use crate::rag::core::unit::RetrievableUnit;
use crate::rag::lexical::inverted_index::InvertedIndex;
use crate::rag::lexical::tokenizer::tokenize;
use crate::rag::retrieval::candidate::ScoredUnit;
use crate::rag::retrieval::retriever::{RetrieveFuture, Retriever};

/// Score every document of `index` against `query`.
///
/// Returns `(doc, score)` pairs with a positive score, best first. Equal
/// scores keep index order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bm25_scores(index: &InvertedIndex, query: &str, config: Bm25Config) -> Vec<(usize, f64)> {
    let doc_count = index.doc_count();
    if doc_count == 0 {
        return Vec::new();
    }

    let mut terms = tokenize(query);
    let mut seen = HashSet::new();
    terms.retain(|term| seen.insert(term.clone()));
    if terms.is_empty() {
        return Vec::new();
    }

    let n = doc_count as f64;
    let avgdl = index.average_doc_length().max(f64::MIN_POSITIVE);
    let Bm25Config { k1, b } = config;
    let mut scores = vec![0.0_f64; doc_count];

    for term in &terms {
        let Some(postings) = index.postings(term) else {
            continue;
        };
        let df = postings.len() as f64;
        let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
        for posting in postings {
            let tf = f64::from(posting.term_frequency);
            let dl = index.doc_length(posting.doc) as f64;
            let norm = tf * (k1 + 1.0) / (tf + k1 * (1.0 - b + b * dl / avgdl));
            scores[posting.doc] += idf * norm;
        }
    }

    let mut ranked: Vec<(usize, f64)> = scores
        .into_iter()
        .enumerate()
        .filter(|(_, score)| *score > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// Keyword retriever over the stored units.
///
/// The index is built once from the unit store and is read-only afterwards.
pub struct LexicalRetriever {
    units: Vec<Arc<RetrievableUnit>>,
    index: InvertedIndex,
    config: Bm25Config,
}

impl LexicalRetriever {
    /// Build the index from `units`.
    ///
    /// # Errors
    /// Returns an error if the parameters are invalid, a unit is empty, or
    /// two units share an id.
    pub fn from_units(
        units: impl IntoIterator<Item = RetrievableUnit>,
        config: Bm25Config,
    ) -> RetrievalResult<Self> {
        config.validate()?;
        let mut index = InvertedIndex::new();
        let mut stored = Vec::new();
        let mut ids = HashSet::new();

        for unit in units {
            unit.validate()?;
            if !ids.insert(unit.id.clone()) {
                return Err(RetrievalError::InvalidUnit(format!(
                    "duplicate unit id {}",
                    unit.id
                )));
            }
            index.add_document(&unit.text);
            stored.push(Arc::new(unit));
        }

        info!(
            "Lexical index built: {} units, {} terms",
            stored.len(),
            index.vocabulary_size()
        );

        Ok(Self {
            units: stored,
            index,
            config,
        })
    }

    /// Number of indexed units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether no unit is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Top `k` units for `query`, synchronously.
    #[must_use]
    pub fn search(&self, query: &str, k: usize) -> Vec<ScoredUnit> {
        let results: Vec<ScoredUnit> = bm25_scores(&self.index, query, self.config)
            .into_iter()
            .take(k)
            .map(|(doc, score)| ScoredUnit::new(Arc::clone(&self.units[doc]), Some(score)))
            .collect();
        debug!("BM25 returned {} units for k={k}", results.len());
        results
    }
}

impl Retriever for LexicalRetriever {
    fn name(&self) -> &'static str {
        "bm25"
    }

    fn retrieve(&self, query: &str, k: usize) -> RetrieveFuture<'_, RetrievalResult<Vec<ScoredUnit>>> {
        let query = query.to_string();
        Box::pin(async move { Ok(self.search(&query, k)) })
    }
}
