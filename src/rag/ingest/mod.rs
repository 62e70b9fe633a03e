//! Ingestion: document loading, chunking, unit persistence and indexing.

pub mod documents;
pub mod pipeline;
pub mod sentence_window;
pub mod unit_store;

pub use documents::{DocumentFormat, LoadedDocuments, SourceDocument, load_directory, load_document};
pub use pipeline::{IngestionPipeline, IngestionReport};
pub use sentence_window::{SentenceWindowChunker, split_sentences};
pub use unit_store::UnitStore;
