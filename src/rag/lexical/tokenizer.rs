//! Term tokenizer shared by the lexical scorers.
//!
//! Lowercases, splits on non-alphanumeric characters and drops English stop
//! words and single-character tokens.

use std::collections::HashSet;
use std::sync::LazyLock;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
        "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
        "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
        "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
        "him", "himself", "his", "how", "if", "in", "into", "is", "it", "its", "itself", "me",
        "more", "most", "my", "myself", "no", "nor", "not", "of", "off", "on", "once", "only",
        "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
        "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves",
        "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
        "until", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while",
        "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
        "yourselves",
    ]
    .into_iter()
    .collect()
});

/// Whether `term` is ignored by the tokenizer.
#[must_use]
pub fn is_stop_word(term: &str) -> bool {
    STOP_WORDS.contains(term)
}

/// Tokenize text into indexable terms, in order of appearance.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 1 && !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_stop_words_and_short_tokens() {
        let tokens = tokenize("What was the Net Revenue of Intel in 2023? A: 54 billion");
        assert_eq!(tokens, vec!["net", "revenue", "intel", "2023", "54", "billion"]);
    }

    #[test]
    fn empty_and_punctuation_only_text() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("?! -- ,").is_empty());
        assert!(is_stop_word("the"));
    }
}
