//! Error types for the question-answering subsystem.

use thiserror::Error;

use crate::rag::retrieval::candidate::RetrievalSource;

/// Retrieval subsystem error type.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Empty or malformed query, rejected before any retriever runs.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// One of the constituent retrievers could not be queried.
    #[error("{retriever} retriever unavailable: {reason}")]
    RetrieverUnavailable {
        /// Which retriever failed.
        retriever: RetrievalSource,
        /// Underlying failure description.
        reason: String,
    },
    /// Both retrievers failed; there is nothing to fall back on.
    #[error("all retrievers failed (dense: {dense}; lexical: {lexical})")]
    AllRetrieversFailed {
        /// Dense retriever failure.
        dense: String,
        /// Lexical retriever failure.
        lexical: String,
    },
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Invalid retrievable unit content.
    #[error("invalid unit: {0}")]
    InvalidUnit(String),
    /// PDF text extraction failed.
    #[error("pdf extraction error: {0}")]
    Pdf(String),
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// Vector store error.
    #[error("vector store error: {0}")]
    VectorStore(#[from] rig::vector_store::VectorStoreError),
    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] rig::embeddings::EmbeddingError),
    /// HTTP client error from Rig.
    #[error("http client error: {0}")]
    HttpClient(#[from] rig::http_client::Error),
    /// Completion error.
    #[error("completion error: {0}")]
    Completion(#[from] rig::completion::CompletionError),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// CSV read/write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RetrievalError {
    /// Whether the error was caused by the caller's input.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Convenience result alias for retrieval operations.
pub type RetrievalResult<T> = Result<T, RetrievalError>;
