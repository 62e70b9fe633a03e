//! Local event discovery.
//!
//! Scraped listings are stored as CSV catalogs, ranked against free-text
//! interests with TF-IDF cosine similarity and optionally filtered by
//! distance from the user.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod finder;
pub mod geo;
pub mod sources;
pub mod types;

pub use cache::EventCache;
pub use catalog::{load_catalog, load_catalogs, write_catalog};
pub use config::{CacheConfig, EventsConfig, SourceConfig};
pub use error::{EventError, EventResult};
pub use finder::EventFinder;
pub use geo::haversine_km;
pub use sources::{EventSourceKind, EventSourceService};
pub use types::{EventMatch, EventQuery, EventRecord, GeoFilter, GeoPoint};

/// Load the configured catalogs and build a finder over them.
///
/// # Errors
/// Returns an error if the configuration is invalid or a catalog is malformed.
pub fn finder_from_config(config: &EventsConfig) -> EventResult<EventFinder> {
    config.validate()?;
    let events = load_catalogs(&config.catalog_paths)?;
    tracing::info!("Event finder ready with {} events", events.len());
    Ok(EventFinder::new(events, config.clone()))
}
