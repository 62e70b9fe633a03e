//! TF-IDF cosine similarity over a single in-memory corpus.
//!
//! Rows are raw term counts weighted by a smoothed idf
//! (`ln((1 + n) / (1 + df)) + 1`) and L2-normalised, so a dot product
//! between a query row and a document row is their cosine similarity.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::rag::core::errors::RetrievalResult;
use crate::rag::core::unit::RetrievableUnit;
use crate::rag::lexical::tokenizer::tokenize;
use crate::rag::retrieval::candidate::ScoredUnit;
use crate::rag::retrieval::retriever::{RetrieveFuture, Retriever};

type SparseRow = Vec<(usize, f64)>;

/// Fitted TF-IDF model and document matrix.
#[derive(Clone, Debug, Default)]
pub struct TfidfIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    rows: Vec<SparseRow>,
}

impl TfidfIndex {
    /// Fit the vocabulary and idf weights on `documents` and vectorise them.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let next = vocabulary.len();
                let term = *vocabulary.entry(token.clone()).or_insert(next);
                if term == document_frequency.len() {
                    document_frequency.push(0);
                }
                if !seen.contains(&term) {
                    seen.push(term);
                    document_frequency[term] += 1;
                }
            }
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut index = Self {
            vocabulary,
            idf,
            rows: Vec::with_capacity(tokenized.len()),
        };
        let rows: Vec<SparseRow> = tokenized.iter().map(|tokens| index.vectorize(tokens)).collect();
        index.rows = rows;
        debug!(
            "TF-IDF fitted on {} documents, {} terms",
            index.rows.len(),
            index.vocabulary.len()
        );
        index
    }

    /// Number of fitted documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the index holds no document.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cosine similarity of `query` against every document, in document order.
    #[must_use]
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let query_row: HashMap<usize, f64> = self.vectorize(&tokenize(query)).into_iter().collect();
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|(term, weight)| query_row.get(term).map(|q| q * weight))
                    .sum()
            })
            .collect()
    }

    /// Best `n` documents with a positive similarity, as `(doc, score)`.
    ///
    /// Equal scores keep document order.
    #[must_use]
    pub fn top_n(&self, query: &str, n: usize) -> Vec<(usize, f64)> {
        self.ranked(query).into_iter().take(n).collect()
    }

    /// Every document with a positive similarity, best first.
    #[must_use]
    pub fn ranked(&self, query: &str) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self
            .scores(query)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    fn vectorize(&self, tokens: &[String]) -> SparseRow {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(&term) = self.vocabulary.get(token) {
                *counts.entry(term).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseRow = counts
            .into_iter()
            .map(|(term, count)| (term, count * self.idf[term]))
            .collect();
        let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in &mut row {
                *weight /= norm;
            }
        }
        row.sort_by_key(|(term, _)| *term);
        row
    }
}

/// [`TfidfIndex`] exposed through the retriever contract.
pub struct TfidfRetriever {
    units: Vec<Arc<RetrievableUnit>>,
    index: TfidfIndex,
}

impl TfidfRetriever {
    /// Fit the index on the units' text.
    ///
    /// # Errors
    /// Returns an error if a unit is empty.
    pub fn from_units(units: impl IntoIterator<Item = RetrievableUnit>) -> RetrievalResult<Self> {
        let units: Vec<Arc<RetrievableUnit>> = units
            .into_iter()
            .map(|unit| unit.validate().map(|()| Arc::new(unit)))
            .collect::<RetrievalResult<_>>()?;
        let texts: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
        let index = TfidfIndex::fit(&texts);
        Ok(Self { units, index })
    }
}

impl Retriever for TfidfRetriever {
    fn name(&self) -> &'static str {
        "tfidf"
    }

    fn retrieve(&self, query: &str, k: usize) -> RetrieveFuture<'_, RetrievalResult<Vec<ScoredUnit>>> {
        let query = query.to_string();
        Box::pin(async move {
            Ok(self
                .index
                .top_n(&query, k)
                .into_iter()
                .map(|(doc, score)| ScoredUnit::new(Arc::clone(&self.units[doc]), Some(score)))
                .collect())
        })
    }
}
