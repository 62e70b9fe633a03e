//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::events::{self, EventFinder};
use crate::rag::RagEngine;

/// Shared application state.
pub struct AppState {
    /// Event search over the loaded catalogs.
    pub events: EventFinder,
    /// Question answering; `None` when disabled or not ingested.
    pub rag: Option<Arc<RagEngine>>,
}

impl AppState {
    /// Create state from already-built parts.
    #[must_use]
    pub fn new(events: EventFinder, rag: Option<Arc<RagEngine>>) -> Arc<Self> {
        Arc::new(Self { events, rag })
    }

    /// Load the event catalogs and, when enabled, the RAG engine.
    ///
    /// A RAG engine that fails to open is logged and left out so event
    /// search keeps working.
    ///
    /// # Errors
    /// Returns an error if the event catalogs cannot be loaded.
    pub async fn from_config(
        config: &AppConfig,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let finder = events::finder_from_config(&config.events)
            .map_err(|e| format!("Failed to load events: {e}"))?;

        let rag = if config.rag_enabled {
            match RagEngine::global(&config.rag).await {
                Ok(engine) => Some(engine),
                Err(e) => {
                    tracing::warn!("RAG engine unavailable, /api/ask disabled: {e}");
                    None
                }
            }
        } else {
            tracing::info!("RAG engine disabled by configuration");
            None
        };

        Ok(Self::new(finder, rag))
    }
}
