//! Run the default question set against one or more completion models and
//! write the answers to a CSV file.
//! Run with: cargo run --bin gout-evaluate [model ...]

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use gout::config::AppConfig;
use gout::rag::evaluation::{DEFAULT_MODELS, DEFAULT_QUESTIONS};
use gout::rag::{OllamaAnswerGenerator, RagEngine, RetrievalResult, evaluate, write_csv};
use gout::start_gout::init_tracing;

/// Output file for the evaluation rows.
const RESULTS_PATH: &str = "results/experiment_results.csv";

async fn run(config: &AppConfig, models: &[String]) -> RetrievalResult<()> {
    let base = RagEngine::from_config(&config.rag).await?;
    let mut rows = Vec::new();

    for model in models {
        let mut llm = config.rag.llm.clone();
        llm.model.clone_from(model);
        let generator = OllamaAnswerGenerator::new(&llm)?;
        let engine = base.with_generator(Arc::new(generator), &config.rag);

        tracing::info!("Evaluating {}", engine.model_name());
        rows.extend(evaluate(&engine, &DEFAULT_QUESTIONS).await);
    }

    write_csv(Path::new(RESULTS_PATH), &rows)?;
    tracing::info!("Wrote {} rows to {}", rows.len(), RESULTS_PATH);
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

    let mut models: Vec<String> = std::env::args().skip(1).collect();
    if models.is_empty() {
        models = DEFAULT_MODELS.iter().map(|m| (*m).to_string()).collect();
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(run(&config, &models)) {
        tracing::error!("Evaluation failed: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
