//! Sentence-window chunking.
//!
//! Every sentence becomes one unit. The unit text is the sentence itself,
//! which is what both indexes see; the surrounding window is kept in
//! metadata for the answer prompt.

use crate::rag::core::ids::UnitId;
use crate::rag::core::metadata::{
    FILE_NAME_KEY, ORDINAL_KEY, ORIGINAL_TEXT_KEY, UnitMetadata, WINDOW_KEY,
};
use crate::rag::core::unit::RetrievableUnit;
use crate::rag::ingest::documents::SourceDocument;

/// Split text into sentences.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or end of
/// text, or at a blank line. Internal whitespace is collapsed.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    fn flush(current: &mut String, sentences: &mut Vec<String>) {
        let sentence = current.split_whitespace().collect::<Vec<_>>().join(" ");
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        current.clear();
    }

    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' && chars.peek() == Some(&'\n') {
            flush(&mut current, &mut sentences);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_none_or(|next| next.is_whitespace()) {
            flush(&mut current, &mut sentences);
        }
    }
    flush(&mut current, &mut sentences);
    sentences
}

/// Produces one unit per sentence with its surrounding window.
#[derive(Clone, Copy, Debug)]
pub struct SentenceWindowChunker {
    window_size: usize,
}

impl SentenceWindowChunker {
    /// Keep `window_size` sentences on each side.
    #[must_use]
    pub const fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    /// Chunk a document into units with deterministic ids.
    #[must_use]
    pub fn chunk(&self, document: &SourceDocument) -> Vec<RetrievableUnit> {
        let sentences = split_sentences(&document.text);
        sentences
            .iter()
            .enumerate()
            .map(|(ordinal, sentence)| {
                let start = ordinal.saturating_sub(self.window_size);
                let end = (ordinal + self.window_size + 1).min(sentences.len());
                let window = sentences[start..end].join(" ");
                let metadata = UnitMetadata::new()
                    .with(FILE_NAME_KEY, document.id.as_str())
                    .with(WINDOW_KEY, window)
                    .with(ORIGINAL_TEXT_KEY, sentence.as_str())
                    .with(ORDINAL_KEY, ordinal_value(ordinal));
                RetrievableUnit::new(UnitId::for_chunk(&document.id, ordinal), sentence.as_str())
                    .with_metadata(metadata)
            })
            .collect()
    }
}

#[allow(clippy::cast_precision_loss)]
const fn ordinal_value(ordinal: usize) -> f64 {
    ordinal as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminators_and_blank_lines() {
        let sentences = split_sentences(
            "Revenue was $54.2 billion. Margins fell!\nWhy?\n\nRisk Factors\nSupply chain",
        );
        assert_eq!(
            sentences,
            vec![
                "Revenue was $54.2 billion.",
                "Margins fell!",
                "Why?",
                "Risk Factors Supply chain",
            ]
        );
    }

    #[test]
    fn windows_are_clamped_at_document_edges() {
        let doc = SourceDocument {
            id: "amd.pdf".to_string(),
            text: "S0. S1. S2. S3. S4.".to_string(),
        };
        let units = SentenceWindowChunker::new(1).chunk(&doc);
        assert_eq!(units.len(), 5);

        assert_eq!(units[0].id.as_str(), "amd.pdf#000000");
        assert_eq!(units[0].metadata.get_text(WINDOW_KEY), Some("S0. S1."));
        assert_eq!(units[2].metadata.get_text(WINDOW_KEY), Some("S1. S2. S3."));
        assert_eq!(units[4].metadata.get_text(WINDOW_KEY), Some("S3. S4."));
        assert_eq!(units[2].text, "S2.");
        assert_eq!(units[2].metadata.get_text(ORIGINAL_TEXT_KEY), Some("S2."));
        assert_eq!(units[2].citation(), Some("amd.pdf"));
    }

    #[test]
    fn chunk_ids_are_stable_across_runs() {
        let doc = SourceDocument {
            id: "nvda.pdf".to_string(),
            text: "One. Two.".to_string(),
        };
        let chunker = SentenceWindowChunker::new(3);
        let first: Vec<_> = chunker.chunk(&doc).into_iter().map(|u| u.id).collect();
        let second: Vec<_> = chunker.chunk(&doc).into_iter().map(|u| u.id).collect();
        assert_eq!(first, second);
    }
}
