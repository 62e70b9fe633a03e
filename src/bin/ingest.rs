//! Ingest the filings in the data directory into the vector index and the
//! unit store.
//! Run with: cargo run --bin gout-ingest [data_dir]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use gout::config::AppConfig;
use gout::rag::{IngestionPipeline, OllamaEmbedder, RetrievalResult, SqliteDenseIndex};
use gout::start_gout::init_tracing;

async fn ingest(config: &AppConfig, data_dir: PathBuf) -> RetrievalResult<()> {
    let embedder = OllamaEmbedder::new(&config.rag.embedding)?;
    let index = Arc::new(SqliteDenseIndex::open(&config.rag).await?);
    let pipeline = IngestionPipeline::from_config(&config.rag, Arc::new(embedder), index.clone())?;

    let report = pipeline.run(&data_dir).await?;
    tracing::info!(
        "Ingested {} documents into {} units ({} embedded, {} skipped) in {:?}",
        report.documents,
        report.units,
        report.embedded,
        report.skipped.len(),
        report.elapsed
    );
    tracing::info!("Vector index now holds {} rows", index.count().await?);
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let data_dir = std::env::args()
        .nth(1)
        .map_or_else(|| config.rag.storage.data_dir.clone(), PathBuf::from);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(ingest(&config, data_dir)) {
        tracing::error!("Ingestion failed: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
