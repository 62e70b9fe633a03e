//! Scrapers producing [`EventRecord`]s from public event listings.

pub mod eventbrite;
pub mod nhfpl;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::events::cache::EventCache;
use crate::events::config::EventsConfig;
use crate::events::error::{EventError, EventResult};
use crate::events::types::EventRecord;

/// Supported event listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSourceKind {
    /// Eventbrite destination API.
    Eventbrite,
    /// New Haven Free Public Library calendar.
    Nhfpl,
}

impl EventSourceKind {
    /// Every source, in scrape order.
    pub const ALL: [Self; 2] = [Self::Eventbrite, Self::Nhfpl];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eventbrite => "eventbrite",
            Self::Nhfpl => "nhfpl",
        }
    }

    /// Catalog file name written by the scrape command.
    #[must_use]
    pub const fn catalog_file(&self) -> &'static str {
        match self {
            Self::Eventbrite => "eventbrite_events.csv",
            Self::Nhfpl => "nhfpl_events.csv",
        }
    }
}

impl fmt::Display for EventSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fetches event listings through one shared HTTP client.
pub struct EventSourceService {
    config: EventsConfig,
    cache: Arc<EventCache>,
    client: reqwest::Client,
}

impl EventSourceService {
    /// Create a service with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: EventsConfig) -> EventResult<Self> {
        config.sources.validate()?;
        let client = Self::build_client(&config)?;
        let cache = Arc::new(EventCache::new(config.cache.clone()));

        Ok(Self {
            config,
            cache,
            client,
        })
    }

    /// Build an HTTP client with browser-like headers.
    fn build_client(config: &EventsConfig) -> EventResult<reqwest::Client> {
        use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};

        let mut headers = HeaderMap::new();

        if let Ok(ua_value) = HeaderValue::from_str(&config.sources.user_agent) {
            headers.insert(USER_AGENT, ua_value);
        }

        if let Ok(accept) =
            HeaderValue::from_str("text/html,application/json;q=0.9,*/*;q=0.8")
        {
            headers.insert(ACCEPT, accept);
        }

        if let Ok(lang) = HeaderValue::from_str("en-US,en;q=0.8") {
            headers.insert(ACCEPT_LANGUAGE, lang);
        }

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.sources.request_timeout)
            .connect_timeout(config.sources.connect_timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| EventError::HttpClient(e.to_string()))
    }

    /// Events from `source`, served from the cache while fresh.
    ///
    /// # Errors
    /// Returns an error if the listing cannot be fetched or parsed.
    pub async fn fetch(&self, source: EventSourceKind) -> EventResult<Vec<EventRecord>> {
        if let Some(cached) = self.cache.get(source) {
            debug!("Cache hit for {} events", source);
            return Ok(cached);
        }

        let events = match source {
            EventSourceKind::Eventbrite => {
                eventbrite::fetch(&self.client, &self.config.sources).await?
            }
            EventSourceKind::Nhfpl => nhfpl::fetch(&self.client, &self.config.sources).await?,
        };

        self.cache.set(source, &events);
        Ok(events)
    }

    /// Fetch every source concurrently.
    ///
    /// A failing source is logged and reported without affecting the others.
    pub async fn fetch_all(&self) -> Vec<(EventSourceKind, EventResult<Vec<EventRecord>>)> {
        let (eventbrite, nhfpl) = tokio::join!(
            self.fetch(EventSourceKind::Eventbrite),
            self.fetch(EventSourceKind::Nhfpl)
        );

        let results = vec![
            (EventSourceKind::Eventbrite, eventbrite),
            (EventSourceKind::Nhfpl, nhfpl),
        ];
        for (source, result) in &results {
            if let Err(e) = result {
                warn!("Scraping {} failed: {}", source, e);
            }
        }
        results
    }

    /// Shared cache.
    #[must_use]
    pub fn cache(&self) -> &EventCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::config::SourceConfig;

    #[test]
    fn catalog_files_match_default_paths() {
        let config = EventsConfig::default();
        for (source, path) in EventSourceKind::ALL.iter().zip(&config.catalog_paths) {
            assert_eq!(
                path.file_name().and_then(|n| n.to_str()),
                Some(source.catalog_file())
            );
        }
    }

    #[tokio::test]
    async fn cached_events_skip_the_network() {
        let mut config = EventsConfig::default();
        config.sources = SourceConfig {
            eventbrite_url: "http://127.0.0.1:9/unreachable".to_string(),
            ..SourceConfig::default()
        };
        let service = EventSourceService::new(config).unwrap();

        let cached = eventbrite::parse_events(
            r#"{"events":[{"name":"Jazz","url":"https://e.example/1","start_date":"2025-05-01","start_time":"19:00"}]}"#,
        )
        .unwrap();
        service.cache().set(EventSourceKind::Eventbrite, &cached);

        let events = service.fetch(EventSourceKind::Eventbrite).await.unwrap();
        assert_eq!(events, cached);
    }

    #[test]
    fn rejects_invalid_source_urls() {
        let mut config = EventsConfig::default();
        config.sources.nhfpl_url = "not a url".to_string();
        assert!(matches!(
            EventSourceService::new(config),
            Err(EventError::InvalidUrl(_))
        ));
    }
}
