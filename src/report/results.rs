use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{csv_writer, output_path, ReportError, RESULTS_FILE, RESULTS_FULL_FILE};
use crate::models::SentimentResult;

const SIMPLE_HEADER: [&str; 4] = ["conversation_id", "sentiment", "score", "summary"];
const FULL_HEADER: [&str; 8] = [
    "conversation_id",
    "sentiment",
    "score",
    "summary",
    "raw_model_output",
    "attempts",
    "latency_sec",
    "error",
];

/// Paths of the two result tables.
#[derive(Debug, Clone)]
pub struct ResultFiles {
    pub simple: PathBuf,
    pub full: PathBuf,
}

#[derive(Serialize)]
struct SimpleRow<'a> {
    conversation_id: &'a str,
    sentiment: Option<&'a str>,
    score: Option<f64>,
    summary: Option<&'a str>,
}

impl<'a> From<&'a SentimentResult> for SimpleRow<'a> {
    fn from(r: &'a SentimentResult) -> Self {
        Self {
            conversation_id: &r.conversation_id,
            sentiment: r.sentiment.as_deref(),
            score: r.score,
            summary: r.summary.as_deref(),
        }
    }
}

/// Write the simple and full result tables into `dir`, in result order.
/// Absent values are written as empty cells.
pub fn write_results(dir: &Path, results: &[SentimentResult]) -> Result<ResultFiles, ReportError> {
    let simple = output_path(dir, RESULTS_FILE)?;
    write_rows(&simple, &SIMPLE_HEADER, results.iter().map(SimpleRow::from))?;
    tracing::info!(path = %simple.display(), rows = results.len(), "Saved results");

    let full = output_path(dir, RESULTS_FULL_FILE)?;
    write_rows(&full, &FULL_HEADER, results.iter())?;
    tracing::info!(path = %full.display(), rows = results.len(), "Saved full results");

    Ok(ResultFiles { simple, full })
}

fn write_rows<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: impl Iterator<Item = T>,
) -> Result<(), ReportError> {
    let csv_err = |source: csv::Error| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv_writer(path, header)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
