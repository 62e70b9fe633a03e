//! Lexical scoring: tokenizer, inverted index, BM25 and TF-IDF.

pub mod bm25;
pub mod inverted_index;
pub mod tfidf;
pub mod tokenizer;

pub use bm25::{LexicalRetriever, bm25_scores};
pub use inverted_index::{InvertedIndex, Posting};
pub use tfidf::{TfidfIndex, TfidfRetriever};
pub use tokenizer::{is_stop_word, tokenize};
