//! Inverted index over tokenized unit text.
//!
//! Documents are addressed by their insertion position, which also serves as
//! the tie-breaker when two documents score the same.

use std::collections::HashMap;

use crate::rag::lexical::tokenizer::tokenize;

/// One entry of a term's postings list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Posting {
    /// Document position.
    pub doc: usize,
    /// Occurrences of the term in the document.
    pub term_frequency: u32,
}

/// Term to postings mapping with per-document lengths.
#[derive(Clone, Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<Posting>>,
    doc_lengths: Vec<usize>,
    total_length: usize,
}

impl InvertedIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `text` as the next document and return its position.
    pub fn add_document(&mut self, text: &str) -> usize {
        let doc = self.doc_lengths.len();
        let tokens = tokenize(text);
        self.doc_lengths.push(tokens.len());
        self.total_length += tokens.len();

        let mut frequencies: HashMap<String, u32> = HashMap::new();
        for token in tokens {
            *frequencies.entry(token).or_insert(0) += 1;
        }
        for (term, term_frequency) in frequencies {
            self.postings.entry(term).or_default().push(Posting {
                doc,
                term_frequency,
            });
        }
        doc
    }

    /// Postings for `term`, if any document contains it.
    #[must_use]
    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    /// Token count of a document.
    #[must_use]
    pub fn doc_length(&self, doc: usize) -> usize {
        self.doc_lengths.get(doc).copied().unwrap_or(0)
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn doc_count(&self) -> usize {
        self.doc_lengths.len()
    }

    /// Number of distinct terms.
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.postings.len()
    }

    /// Mean document length in tokens.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_doc_length(&self) -> f64 {
        if self.doc_lengths.is_empty() {
            return 0.0;
        }
        self.total_length as f64 / self.doc_lengths.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_term_frequencies_per_document() {
        let mut index = InvertedIndex::new();
        let first = index.add_document("revenue revenue growth");
        let second = index.add_document("operating revenue");

        assert_eq!((first, second), (0, 1));
        assert_eq!(index.doc_count(), 2);
        let postings = index.postings("revenue").unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0], Posting { doc: 0, term_frequency: 2 });
        assert_eq!(index.doc_length(0), 3);
        assert!((index.average_doc_length() - 2.5).abs() < f64::EPSILON);
        assert_eq!(index.vocabulary_size(), 3);
    }

    #[test]
    fn stop_words_are_not_indexed() {
        let mut index = InvertedIndex::new();
        index.add_document("the cost of the goods");
        assert!(index.postings("the").is_none());
        assert!(index.postings("goods").is_some());
    }
}
