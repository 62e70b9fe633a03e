//! New Haven Free Public Library LibCal calendar.

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::events::config::SourceConfig;
use crate::events::error::{EventError, EventResult};
use crate::events::types::EventRecord;

/// Source site recorded on every library event.
pub const SOURCE_SITE: &str = "NHFPL";

/// Venue name; the calendar cards do not carry one.
pub const LOCATION_NAME: &str = "New Haven Free Public Library";

struct CardSelectors {
    card: Selector,
    title: Selector,
    date: Selector,
    time: Selector,
}

impl CardSelectors {
    fn new() -> EventResult<Self> {
        Ok(Self {
            card: selector("div.s-lc-fs-i")?,
            title: selector("h3.s-lc-fs-i-h-title a")?,
            date: selector("span.s-lc-fs-i-date-value")?,
            time: selector("span.s-lc-fs-i-time-value")?,
        })
    }
}

fn selector(css: &str) -> EventResult<Selector> {
    Selector::parse(css).map_err(|e| EventError::HtmlParse(format!("{css}: {e:?}")))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the calendar page.
///
/// Relative links are resolved against `base_url`. Cards without a title
/// link, date or time are skipped.
///
/// # Errors
/// Returns an error if a selector fails to compile.
pub fn parse_events(html: &str, base_url: &str) -> EventResult<Vec<EventRecord>> {
    let selectors = CardSelectors::new()?;
    let document = Html::parse_document(html);
    let mut events = Vec::new();

    for card in document.select(&selectors.card) {
        let Some(record) = parse_card(&card, &selectors, base_url) else {
            debug!("Skipping a non-event card");
            continue;
        };
        events.push(record);
    }

    Ok(events)
}

fn parse_card(
    card: &ElementRef<'_>,
    selectors: &CardSelectors,
    base_url: &str,
) -> Option<EventRecord> {
    let link = card.select(&selectors.title).next()?;
    let title = element_text(&link);
    let href = link.value().attr("href")?;
    let date = element_text(&card.select(&selectors.date).next()?);
    let time = element_text(&card.select(&selectors.time).next()?);

    if title.is_empty() {
        return None;
    }

    let source_url = if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    };

    Some(EventRecord {
        description: title.clone(),
        title,
        datetime: format!("{date} {time}"),
        location_name: LOCATION_NAME.to_string(),
        address: "Address not specified".to_string(),
        source_url,
        source_site: SOURCE_SITE.to_string(),
        category: None,
        latitude: None,
        longitude: None,
    })
}

/// Fetch and parse the calendar page.
///
/// # Errors
/// Returns an error on transport failure or a non-success status.
pub async fn fetch(client: &Client, config: &SourceConfig) -> EventResult<Vec<EventRecord>> {
    let response = client.get(&config.nhfpl_url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(EventError::HttpStatus {
            url: config.nhfpl_url.clone(),
            status: status.as_u16(),
        });
    }

    let html = response.text().await?;
    let events = parse_events(&html, &config.nhfpl_base_url)?;
    info!("Fetched {} NHFPL events", events.len());
    Ok(events)
}
