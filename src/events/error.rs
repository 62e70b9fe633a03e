//! Error types for the event finder and its sources.

use thiserror::Error;

/// Errors raised while loading, searching or scraping events.
#[derive(Debug, Error)]
pub enum EventError {
    /// Empty or malformed search query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Source answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Status code.
        status: u16,
    },

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTML parsing error.
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EventError {
    /// Whether the error was caused by the caller's input.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidQuery(_))
    }
}

/// Convenience result alias for event operations.
pub type EventResult<T> = Result<T, EventError>;
