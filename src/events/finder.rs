//! Text search over the event catalog with an optional distance filter.

use tracing::debug;

use crate::events::config::EventsConfig;
use crate::events::error::{EventError, EventResult};
use crate::events::geo::haversine_km;
use crate::events::types::{EventMatch, EventQuery, EventRecord, GeoPoint};
use crate::rag::lexical::TfidfIndex;

/// TF-IDF ranking over a fixed set of events.
#[derive(Clone, Debug)]
pub struct EventFinder {
    events: Vec<EventRecord>,
    index: TfidfIndex,
    config: EventsConfig,
}

impl EventFinder {
    /// Fit the index over `events`.
    #[must_use]
    pub fn new(events: Vec<EventRecord>, config: EventsConfig) -> Self {
        let texts: Vec<String> = events.iter().map(EventRecord::search_text).collect();
        let index = TfidfIndex::fit(&texts);
        Self {
            events,
            index,
            config,
        }
    }

    /// Number of indexed events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Indexed events in catalog order.
    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Rank events for `query`, best first.
    ///
    /// The distance filter runs before truncation, so up to `top_n` nearby
    /// matches come back even when better matches lie outside the radius.
    ///
    /// # Errors
    /// Returns [`EventError::InvalidQuery`] for an empty query, a zero
    /// `top_n` or an invalid distance filter.
    pub fn search(&self, query: &EventQuery) -> EventResult<Vec<EventMatch>> {
        let text = query.text.trim();
        if text.is_empty() {
            return Err(EventError::InvalidQuery("query text is empty".to_string()));
        }

        let top_n = query.top_n.unwrap_or(self.config.top_n);
        if top_n == 0 {
            return Err(EventError::InvalidQuery("top_n must be > 0".to_string()));
        }

        if let Some(filter) = &query.near {
            filter.origin.validate()?;
            if !filter.radius_km.is_finite() || filter.radius_km <= 0.0 {
                return Err(EventError::InvalidQuery(
                    "radius_km must be a positive number".to_string(),
                ));
            }
        }

        let matches: Vec<EventMatch> = self
            .index
            .ranked(text)
            .into_iter()
            .filter(|(_, score)| *score > self.config.min_score)
            .filter_map(|(doc, score)| {
                let event = &self.events[doc];
                let distance_km = match &query.near {
                    Some(filter) => {
                        let distance = haversine_km(filter.origin, event.location()?);
                        if distance > filter.radius_km {
                            return None;
                        }
                        Some(distance)
                    }
                    None => None,
                };
                Some(EventMatch {
                    event: event.clone(),
                    score,
                    distance_km,
                })
            })
            .take(top_n)
            .collect();

        debug!("Event search '{}' returned {} matches", text, matches.len());
        Ok(matches)
    }

    /// First match with coordinates, else the configured default center.
    #[must_use]
    pub fn map_center(&self, matches: &[EventMatch]) -> GeoPoint {
        matches
            .iter()
            .find_map(|m| m.event.location())
            .unwrap_or(self.config.default_center)
    }
}
