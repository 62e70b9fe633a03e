//! Answer prompt construction under a character budget.

use crate::rag::core::metadata::WINDOW_KEY;
use crate::rag::retrieval::candidate::ScoredCandidate;

/// Instructions sent as the system preamble.
pub const SYSTEM_PROMPT: &str = "You are a financial analyst assistant. Answer the question using \
only the numbered 10-K excerpts provided. Cite the source file of every figure you use. If the \
excerpts do not contain the answer, say that the filings provided do not cover it.";

/// One context passage offered to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextPassage {
    /// Source document name.
    pub citation: Option<String>,
    /// Passage text: the sentence window when available, else the unit text.
    pub text: String,
}

impl ContextPassage {
    /// Build the passage for a retrieved candidate.
    #[must_use]
    pub fn from_candidate(candidate: &ScoredCandidate) -> Self {
        let text = candidate
            .metadata()
            .get_text(WINDOW_KEY)
            .unwrap_or_else(|| candidate.text())
            .to_string();
        Self {
            citation: candidate.unit.citation().map(str::to_string),
            text,
        }
    }
}

/// Render the user prompt.
#[must_use]
pub fn build_prompt(question: &str, passages: &[ContextPassage]) -> String {
    let mut prompt = String::from("[CONTEXT]\n");
    for (n, passage) in passages.iter().enumerate() {
        let citation = passage.citation.as_deref().unwrap_or("unknown source");
        prompt.push_str(&format!("[{}] ({citation}) {}\n", n + 1, passage.text));
    }
    prompt.push_str("\n[QUESTION]\n");
    prompt.push_str(question.trim());
    prompt.push('\n');
    prompt
}

/// Drop passages from the tail until the prompt fits `max_chars`.
///
/// The question is never truncated. Returns the prompt and the number of
/// passages kept.
#[must_use]
pub fn fit_to_budget(
    question: &str,
    mut passages: Vec<ContextPassage>,
    max_chars: usize,
) -> (String, usize) {
    loop {
        let prompt = build_prompt(question, &passages);
        if prompt.chars().count() <= max_chars || passages.is_empty() {
            return (prompt, passages.len());
        }
        passages.pop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::rag::core::metadata::UnitMetadata;
    use crate::rag::core::unit::RetrievableUnit;
    use crate::rag::retrieval::candidate::RetrievalSource;

    fn passage(citation: &str, text: &str) -> ContextPassage {
        ContextPassage {
            citation: Some(citation.to_string()),
            text: text.to_string(),
        }
    }

    #[test]
    fn prefers_window_over_sentence() {
        let unit = RetrievableUnit::new("u1", "Margin fell.").with_metadata(
            UnitMetadata::new()
                .with("file_name", "intc.pdf")
                .with(WINDOW_KEY, "Revenue declined. Margin fell. Costs rose."),
        );
        let candidate = ScoredCandidate {
            unit: Arc::new(unit),
            source: RetrievalSource::Lexical,
            score: None,
        };
        let passage = ContextPassage::from_candidate(&candidate);
        assert_eq!(passage.text, "Revenue declined. Margin fell. Costs rose.");
        assert_eq!(passage.citation.as_deref(), Some("intc.pdf"));
    }

    #[test]
    fn prompt_numbers_passages_and_ends_with_question() {
        let prompt = build_prompt(
            " What was revenue? ",
            &[passage("a.pdf", "Revenue was 10."), passage("b.pdf", "Revenue was 20.")],
        );
        assert!(prompt.contains("[1] (a.pdf) Revenue was 10."));
        assert!(prompt.contains("[2] (b.pdf) Revenue was 20."));
        assert!(prompt.ends_with("[QUESTION]\nWhat was revenue?\n"));
    }

    #[test]
    fn budget_drops_tail_passages_first() {
        let passages = vec![
            passage("a.pdf", &"x".repeat(50)),
            passage("b.pdf", &"y".repeat(50)),
            passage("c.pdf", &"z".repeat(50)),
        ];
        let full = build_prompt("q", &passages).chars().count();
        let (prompt, kept) = fit_to_budget("q", passages, full - 10);
        assert_eq!(kept, 2);
        assert!(prompt.contains("(a.pdf)"));
        assert!(!prompt.contains("(c.pdf)"));
    }

    #[test]
    fn tiny_budget_keeps_question_only() {
        let (prompt, kept) = fit_to_budget("question", vec![passage("a.pdf", "text")], 1);
        assert_eq!(kept, 0);
        assert!(prompt.contains("question"));
    }
}
