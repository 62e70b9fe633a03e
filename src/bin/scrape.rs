//! Scrape every event source and write one CSV catalog per source.
//! Run with: cargo run --bin gout-scrape [output_dir]

use std::path::PathBuf;
use std::process::ExitCode;

use gout::config::AppConfig;
use gout::events::{EventSourceService, write_catalog};
use gout::start_gout::init_tracing;

fn main() -> ExitCode {
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let output_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("data"), PathBuf::from);

    let service = match EventSourceService::new(config.events) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create scraper: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let mut saved = 0;
    for (source, result) in rt.block_on(service.fetch_all()) {
        let Ok(events) = result else {
            continue;
        };
        if events.is_empty() {
            tracing::warn!("No {} events scraped", source);
            continue;
        }
        let path = output_dir.join(source.catalog_file());
        match write_catalog(&path, &events) {
            Ok(()) => saved += 1,
            Err(e) => tracing::error!("Failed to save {} events: {e}", source),
        }
    }

    if saved == 0 {
        tracing::error!("No catalog was written");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
