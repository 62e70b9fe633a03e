//! CSV event catalogs written by the scrapers and read by the finder.

use std::path::Path;

use tracing::{info, warn};

use crate::events::error::EventResult;
use crate::events::types::EventRecord;

/// Read one catalog file.
///
/// # Errors
/// Returns an error if the file cannot be opened or a row does not parse.
pub fn load_catalog(path: &Path) -> EventResult<Vec<EventRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let events = reader
        .deserialize::<EventRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    info!("Loaded {} events from {}", events.len(), path.display());
    Ok(events)
}

/// Read every catalog that exists, in order.
///
/// Missing files are skipped with a warning; malformed ones are errors.
///
/// # Errors
/// Returns an error if an existing catalog cannot be read.
pub fn load_catalogs<P: AsRef<Path>>(paths: &[P]) -> EventResult<Vec<EventRecord>> {
    let mut events = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Event catalog {} not found, skipping", path.display());
            continue;
        }
        events.extend(load_catalog(path)?);
    }
    Ok(events)
}

/// Write events to `path`, creating parent directories.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_catalog(path: &Path, events: &[EventRecord]) -> EventResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for event in events {
        writer.serialize(event)?;
    }
    writer.flush()?;
    info!("Saved {} events to {}", events.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_without_optional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        std::fs::write(
            &path,
            "title,datetime,location_name,address,description,source_url,source_site\n\
             Jazz Night,2025-05-01T19:00,Cafe Nine,250 State St,,https://e.example/1,Eventbrite\n",
        )
        .unwrap();

        let events = load_catalog(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Jazz Night");
        assert_eq!(events[0].description, "");
        assert_eq!(events[0].latitude, None);
        assert_eq!(events[0].location(), None);
    }

    #[test]
    fn write_then_load_keeps_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.csv");
        let event = EventRecord {
            title: "Story Time".to_string(),
            datetime: "Monday, May 5, 2025 10:30am".to_string(),
            location_name: "New Haven Free Public Library".to_string(),
            address: "133 Elm St".to_string(),
            description: "Stories for toddlers".to_string(),
            source_url: "https://nhfpl.libcal.com/event/1".to_string(),
            source_site: "NHFPL".to_string(),
            category: Some("Kids".to_string()),
            latitude: Some(41.3083),
            longitude: Some(-72.9279),
        };

        write_catalog(&path, std::slice::from_ref(&event)).unwrap();
        assert_eq!(load_catalog(&path).unwrap(), vec![event]);
    }

    #[test]
    fn missing_catalogs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let events = load_catalogs(&[dir.path().join("absent.csv")]).unwrap();
        assert!(events.is_empty());
    }
}
