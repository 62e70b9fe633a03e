//! Configuration for the event finder and its scrapers.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::events::error::{EventError, EventResult};
use crate::events::types::GeoPoint;

/// West Haven, CT: map center when no event has coordinates.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint::new(41.2709, -72.9463);

/// Event ids queried from the Eventbrite destination API.
pub const DEFAULT_EVENTBRITE_IDS: [&str; 20] = [
    "1549842654099",
    "1320078683879",
    "1388545209099",
    "1364385456629",
    "1607418414749",
    "1712166208219",
    "1871457773579",
    "1512708284199",
    "1617757408959",
    "1355200343709",
    "1867120400379",
    "1657055811539",
    "1777673512329",
    "1702065195819",
    "1708736800769",
    "1510992211379",
    "1791962430869",
    "1758351419429",
    "1731624638909",
    "1626462124999",
];

/// Event finder settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Results returned when the query does not say.
    pub top_n: usize,
    /// Matches scoring at or below this value are dropped.
    pub min_score: f64,
    /// Map center used when no result has coordinates.
    pub default_center: GeoPoint,
    /// CSV catalogs loaded at startup.
    pub catalog_paths: Vec<PathBuf>,
    /// Scraper settings.
    pub sources: SourceConfig,
    /// Scrape cache settings.
    pub cache: CacheConfig,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            min_score: 0.0,
            default_center: DEFAULT_CENTER,
            catalog_paths: vec![
                PathBuf::from("data/eventbrite_events.csv"),
                PathBuf::from("data/nhfpl_events.csv"),
            ],
            sources: SourceConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl EventsConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> EventResult<()> {
        if self.top_n == 0 {
            return Err(EventError::Config("events.top_n must be > 0".to_string()));
        }

        if !self.min_score.is_finite() || self.min_score < 0.0 {
            return Err(EventError::Config(
                "events.min_score must be a finite value >= 0".to_string(),
            ));
        }

        self.default_center
            .validate()
            .map_err(|e| EventError::Config(format!("events.default_center: {e}")))?;

        self.sources.validate()
    }
}

/// Scraper settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Eventbrite destination API endpoint.
    pub eventbrite_url: String,
    /// Event ids requested from Eventbrite.
    pub eventbrite_event_ids: Vec<String>,
    /// NHFPL calendar page.
    pub nhfpl_url: String,
    /// Base used to absolutise NHFPL event links.
    pub nhfpl_base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            eventbrite_url: "https://www.eventbrite.com/api/v3/destination/events/".to_string(),
            eventbrite_event_ids: DEFAULT_EVENTBRITE_IDS
                .iter()
                .map(|id| (*id).to_string())
                .collect(),
            nhfpl_url: "https://nhfpl.libcal.com/calendar".to_string(),
            nhfpl_base_url: "https://nhfpl.libcal.com".to_string(),
        }
    }
}

impl SourceConfig {
    /// Validate URLs and ids.
    ///
    /// # Errors
    /// Returns an error if a URL does not parse or no Eventbrite id is set.
    pub fn validate(&self) -> EventResult<()> {
        Url::parse(&self.eventbrite_url)?;
        Url::parse(&self.nhfpl_url)?;
        Url::parse(&self.nhfpl_base_url)?;

        if self.eventbrite_event_ids.is_empty() {
            return Err(EventError::Config(
                "sources.eventbrite_event_ids must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Scrape cache settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether caching is enabled.
    pub enabled: bool,
    /// Time-to-live for scraped event lists, in seconds.
    pub ttl_seconds: u64,
    /// Maximum number of cached entries.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 1800, // 30 minutes
            max_entries: 16,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EventsConfig::default();
        assert_eq!(config.top_n, 5);
        assert_eq!(config.catalog_paths.len(), 2);
        assert_eq!(config.sources.eventbrite_event_ids.len(), 20);
        assert!(config.cache.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_top_n() {
        let config = EventsConfig {
            top_n: 0,
            ..EventsConfig::default()
        };
        assert!(matches!(config.validate(), Err(EventError::Config(_))));
    }

    #[test]
    fn timeouts_round_trip_as_seconds() {
        let json = serde_json::to_value(SourceConfig::default()).unwrap();
        assert_eq!(json["request_timeout"], 30);

        let parsed: SourceConfig =
            serde_json::from_str(r#"{"request_timeout": 5, "nhfpl_url": "https://example.org/cal"}"#)
                .unwrap();
        assert_eq!(parsed.request_timeout, Duration::from_secs(5));
        assert_eq!(parsed.connect_timeout, Duration::from_secs(10));
        assert_eq!(parsed.nhfpl_url, "https://example.org/cal");
    }
}
