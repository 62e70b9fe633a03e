//! Event records, queries and matches.

use serde::{Deserialize, Serialize};

use crate::events::error::{EventError, EventResult};

/// A geographic coordinate in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in `[-180, 180]`.
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check coordinate ranges.
    ///
    /// # Errors
    /// Returns an error if a coordinate is out of range or not finite.
    pub fn validate(&self) -> EventResult<()> {
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude)
        {
            return Err(EventError::InvalidQuery(format!(
                "coordinates out of range: ({}, {})",
                self.latitude, self.longitude
            )));
        }
        Ok(())
    }
}

/// One scraped event, as stored in the catalog CSV files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event title.
    pub title: String,
    /// Start date and time as published by the source.
    pub datetime: String,
    /// Venue name.
    pub location_name: String,
    /// Street address.
    pub address: String,
    /// Free-text description; empty when the source had none.
    #[serde(default)]
    pub description: String,
    /// Event page.
    pub source_url: String,
    /// Source site name.
    pub source_site: String,
    /// Optional category label.
    #[serde(default)]
    pub category: Option<String>,
    /// Venue latitude, when known.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Venue longitude, when known.
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl EventRecord {
    /// Venue coordinates, when both are present.
    #[must_use]
    pub fn location(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(self.latitude?, self.longitude?))
    }

    /// Text the lexical scorer sees.
    #[must_use]
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// Keep only events within `radius_km` of `origin`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoFilter {
    /// Center of the search area.
    pub origin: GeoPoint,
    /// Radius in kilometres.
    pub radius_km: f64,
}

/// An event search request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventQuery {
    /// Free-text interests, e.g. "live music".
    pub text: String,
    /// Number of results; the finder default when absent.
    #[serde(default)]
    pub top_n: Option<usize>,
    /// Optional distance filter.
    #[serde(default)]
    pub near: Option<GeoFilter>,
}

impl EventQuery {
    /// Query with default size and no distance filter.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            top_n: None,
            near: None,
        }
    }

    /// Set the result count.
    #[must_use]
    pub const fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    /// Restrict results to a radius around `origin`.
    #[must_use]
    pub const fn near(mut self, origin: GeoPoint, radius_km: f64) -> Self {
        self.near = Some(GeoFilter { origin, radius_km });
        self
    }
}

/// A ranked search result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventMatch {
    /// Matched event.
    pub event: EventRecord,
    /// Cosine similarity with the query.
    pub score: f64,
    /// Distance from the filter origin, when a filter was given.
    pub distance_km: Option<f64>,
}
