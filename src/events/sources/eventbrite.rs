//! Eventbrite destination API.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::events::config::SourceConfig;
use crate::events::error::{EventError, EventResult};
use crate::events::types::EventRecord;

/// Source site recorded on every Eventbrite event.
pub const SOURCE_SITE: &str = "Eventbrite";

const EXPAND: &str =
    "event_sales_status,image,primary_venue,saves,ticket_availability,primary_organizer,public_collections";

#[derive(Debug, Deserialize)]
struct DestinationResponse {
    #[serde(default)]
    events: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    name: String,
    url: String,
    start_date: String,
    start_time: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    primary_venue: Option<RawVenue>,
    #[serde(default)]
    tags: Vec<RawTag>,
}

#[derive(Debug, Deserialize)]
struct RawVenue {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<RawAddress>,
}

#[derive(Debug, Deserialize)]
struct RawAddress {
    #[serde(default)]
    localized_address_display: Option<String>,
    #[serde(default)]
    latitude: Option<Value>,
    #[serde(default)]
    longitude: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

/// Parse a destination API response body.
///
/// Events missing a required field are skipped with a warning.
///
/// # Errors
/// Returns an error if the body is not a JSON object with an `events` list.
pub fn parse_events(body: &str) -> EventResult<Vec<EventRecord>> {
    let response: DestinationResponse = serde_json::from_str(body)?;
    let mut events = Vec::with_capacity(response.events.len());

    for value in response.events {
        match serde_json::from_value::<RawEvent>(value) {
            Ok(raw) => events.push(raw.into_record()),
            Err(e) => warn!("Could not parse an Eventbrite event: {}", e),
        }
    }

    Ok(events)
}

/// Fetch the configured events.
///
/// # Errors
/// Returns an error on transport failure, a non-success status or an
/// unparseable body.
pub async fn fetch(client: &Client, config: &SourceConfig) -> EventResult<Vec<EventRecord>> {
    let event_ids = config.eventbrite_event_ids.join(",");
    let page_size = config.eventbrite_event_ids.len().to_string();

    let response = client
        .get(&config.eventbrite_url)
        .query(&[
            ("event_ids", event_ids.as_str()),
            ("page_size", page_size.as_str()),
            ("expand", EXPAND),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(EventError::HttpStatus {
            url: config.eventbrite_url.clone(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    let events = parse_events(&body)?;
    info!("Fetched {} Eventbrite events", events.len());
    Ok(events)
}

impl RawEvent {
    fn into_record(self) -> EventRecord {
        let (location_name, address, latitude, longitude) = match self.primary_venue {
            Some(venue) => {
                let name = venue.name.unwrap_or_else(|| "N/A".to_string());
                match venue.address {
                    Some(address) => (
                        name,
                        address
                            .localized_address_display
                            .unwrap_or_else(|| "Address not specified".to_string()),
                        address.latitude.as_ref().and_then(coordinate),
                        address.longitude.as_ref().and_then(coordinate),
                    ),
                    None => (name, "Address not specified".to_string(), None, None),
                }
            }
            None => ("Online Event".to_string(), "Online".to_string(), None, None),
        };

        let category = self
            .tags
            .into_iter()
            .find(|tag| tag.prefix.as_deref() == Some("EventbriteCategory"))
            .and_then(|tag| tag.display_name);

        EventRecord {
            title: self.name,
            datetime: format!("{}T{}", self.start_date, self.start_time),
            location_name,
            address,
            description: self
                .summary
                .unwrap_or_else(|| "No summary provided.".to_string()),
            source_url: self.url,
            source_site: SOURCE_SITE.to_string(),
            category,
            latitude,
            longitude,
        }
    }
}

/// Coordinates arrive as strings or numbers.
fn coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "events": [
            {
                "name": "Jazz Night",
                "summary": "Live jazz downtown",
                "url": "https://www.eventbrite.com/e/jazz-night-1",
                "start_date": "2025-05-01",
                "start_time": "19:00",
                "primary_venue": {
                    "name": "Cafe Nine",
                    "address": {
                        "localized_address_display": "250 State St, New Haven, CT 06510",
                        "latitude": "41.3045",
                        "longitude": "-72.9226"
                    }
                },
                "tags": [
                    {"prefix": "EventbriteFormat", "display_name": "Concert"},
                    {"prefix": "EventbriteCategory", "display_name": "Music"}
                ]
            },
            {
                "name": "Remote Budgeting 101",
                "url": "https://www.eventbrite.com/e/budgeting-2",
                "start_date": "2025-05-03",
                "start_time": "12:00",
                "primary_venue": null
            },
            {
                "name": "Venue Without Address",
                "summary": null,
                "url": "https://www.eventbrite.com/e/no-address-3",
                "start_date": "2025-05-04",
                "start_time": "09:30",
                "primary_venue": {"name": "Town Green", "address": null}
            },
            {
                "summary": "no name, no url",
                "start_date": "2025-05-05",
                "start_time": "10:00"
            }
        ]
    }"#;

    #[test]
    fn parses_and_normalises_events() {
        let events = parse_events(FIXTURE).unwrap();
        assert_eq!(events.len(), 3);

        let jazz = &events[0];
        assert_eq!(jazz.title, "Jazz Night");
        assert_eq!(jazz.datetime, "2025-05-01T19:00");
        assert_eq!(jazz.location_name, "Cafe Nine");
        assert_eq!(jazz.address, "250 State St, New Haven, CT 06510");
        assert_eq!(jazz.description, "Live jazz downtown");
        assert_eq!(jazz.source_site, SOURCE_SITE);
        assert_eq!(jazz.category.as_deref(), Some("Music"));
        assert_eq!(jazz.latitude, Some(41.3045));
        assert_eq!(jazz.longitude, Some(-72.9226));
    }

    #[test]
    fn missing_venue_means_online() {
        let events = parse_events(FIXTURE).unwrap();
        let online = &events[1];
        assert_eq!(online.location_name, "Online Event");
        assert_eq!(online.address, "Online");
        assert_eq!(online.description, "No summary provided.");
        assert_eq!(online.location(), None);

        let no_address = &events[2];
        assert_eq!(no_address.location_name, "Town Green");
        assert_eq!(no_address.address, "Address not specified");
    }

    #[test]
    fn rejects_non_json_body() {
        assert!(matches!(
            parse_events("<html>blocked</html>"),
            Err(EventError::JsonParse(_))
        ));
    }
}
