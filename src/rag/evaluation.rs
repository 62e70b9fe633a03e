//! Batch evaluation of the engine over a fixed question set.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::rag::core::errors::RetrievalResult;
use crate::rag::engine::RagEngine;

/// Questions over the 2024 10-K filings of INTC, META, NVDA, AMZN and GOOG.
pub const DEFAULT_QUESTIONS: [&str; 10] = [
    "What was Nvidia's total revenue for the fiscal year 2024?",
    "What was the net sales revenue specifically for Amazon Web Services (AWS) in 2024?",
    "Did Intel's total revenue increase or decrease in 2024 compared to 2023, and by how much?",
    "What was the operating loss reported for Meta's Reality Labs segment in 2024?",
    "What specific risk factors does Alphabet (Google) list regarding Generative AI and Large Language Models?",
    "Who does Nvidia identify as its main competitors in the Data Center market?",
    "How much did Meta spend on Research and Development (R&D) in 2024?",
    "What factors does Amazon list as affecting its shipping and fulfillment costs?",
    "What are the key antitrust legal proceedings mentioned by Alphabet (Google) in the 10-K?",
    "Describe Intel's 'IDM 2.0' strategy and the risks associated with it.",
];

/// Models compared by default.
pub const DEFAULT_MODELS: [&str; 1] = ["phi3:mini"];

/// One question answered by one model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvaluationRow {
    /// Model name.
    #[serde(rename = "Model")]
    pub model: String,
    /// Question asked.
    #[serde(rename = "Question")]
    pub question: String,
    /// Answer, or `ERROR: ...` when the question failed.
    #[serde(rename = "Answer")]
    pub answer: String,
    /// Distinct cited files, comma separated, or `N/A` on error.
    #[serde(rename = "Sources")]
    pub sources: String,
    /// Wall time in seconds, two decimals.
    #[serde(rename = "Time_Sec")]
    pub time_sec: f64,
}

/// Ask every question with `engine`. Failures become rows, not errors.
pub async fn evaluate(engine: &RagEngine, questions: &[&str]) -> Vec<EvaluationRow> {
    let model = engine.model_name().to_string();
    let mut rows = Vec::with_capacity(questions.len());

    for (n, question) in questions.iter().enumerate() {
        info!("[{model}] Q{}: {question}", n + 1);
        let started = Instant::now();
        let (answer, sources) = match engine.ask(question).await {
            Ok(answer) => {
                let mut files: Vec<&str> = Vec::new();
                for candidate in &answer.candidates {
                    let file = candidate.file_name.as_deref().unwrap_or("Unknown");
                    if !files.contains(&file) {
                        files.push(file);
                    }
                }
                let sources = files.join(", ");
                (answer.text, sources)
            }
            Err(err) => {
                warn!("[{model}] Q{} failed: {err}", n + 1);
                (format!("ERROR: {err}"), "N/A".to_string())
            }
        };
        let time_sec = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        rows.push(EvaluationRow {
            model: model.clone(),
            question: (*question).to_string(),
            answer,
            sources,
            time_sec,
        });
    }
    rows
}

/// Write rows as CSV with a header line, creating parent directories.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_csv(path: &Path, rows: &[EvaluationRow]) -> RetrievalResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} evaluation rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::rag::answer::AnswerStage;
    use crate::rag::core::config::{Bm25Config, HybridConfig, PromptConfig};
    use crate::rag::core::metadata::UnitMetadata;
    use crate::rag::core::unit::RetrievableUnit;
    use crate::rag::lexical::bm25::LexicalRetriever;
    use crate::rag::retrieval::hybrid::HybridRetriever;
    use crate::rag::test_support::{RecordingGenerator, ScriptedRetriever};

    fn engine(generator: RecordingGenerator) -> RagEngine {
        let lexical = LexicalRetriever::from_units(
            vec![
                RetrievableUnit::new("amzn.pdf#000000", "AWS net sales were 107.6 billion.")
                    .with_metadata(UnitMetadata::new().with("file_name", "amzn.pdf")),
                RetrievableUnit::new("x#0", "AWS segment detail without citation."),
            ],
            Bm25Config::default(),
        )
        .unwrap();
        let hybrid = HybridRetriever::new(
            Arc::new(ScriptedRetriever::returning(Vec::new())),
            Arc::new(lexical),
            HybridConfig::default(),
        )
        .unwrap();
        RagEngine::new(
            hybrid,
            AnswerStage::new(Arc::new(generator), PromptConfig::default()),
        )
    }

    #[tokio::test]
    async fn rows_record_answers_and_sources() {
        let rows = evaluate(&engine(RecordingGenerator::new("107.6B")), &["AWS net sales"]).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].model, "recording");
        assert_eq!(rows[0].answer, "107.6B");
        assert_eq!(rows[0].sources, "amzn.pdf, Unknown");
        assert!(rows[0].time_sec >= 0.0);
    }

    #[tokio::test]
    async fn failures_become_error_rows() {
        let rows = evaluate(
            &engine(RecordingGenerator::failing("model not found")),
            &["AWS net sales", "  "],
        )
        .await;
        assert_eq!(rows.len(), 2);
        assert!(rows[0].answer.starts_with("ERROR: "));
        assert!(rows[0].answer.contains("model not found"));
        assert_eq!(rows[0].sources, "N/A");
        assert!(rows[1].answer.starts_with("ERROR: invalid input"));
    }

    #[test]
    fn csv_has_expected_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results/experiment_results.csv");
        let rows = vec![EvaluationRow {
            model: "phi3:mini".to_string(),
            question: "Q?".to_string(),
            answer: "A, with comma".to_string(),
            sources: "N/A".to_string(),
            time_sec: 1.25,
        }];
        write_csv(&path, &rows).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("Model,Question,Answer,Sources,Time_Sec"));
        assert_eq!(lines.next(), Some("phi3:mini,Q?,\"A, with comma\",N/A,1.25"));
        assert_eq!(DEFAULT_QUESTIONS.len(), 10);
        assert_eq!(DEFAULT_MODELS, ["phi3:mini"]);
    }
}
