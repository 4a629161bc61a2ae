//! Output sinks for a finished run.
//!
//! | File | Content |
//! |------|---------|
//! | `sentiment_results_ollama_optimized.csv` | id, sentiment, score, summary |
//! | `sentiment_results_ollama_optimized_full.csv` | every result field |
//! | `run_stats_ollama_optimized.json` | RunStats (host metrics flattened in) |
//! | `batch_stats_ollama_optimized.csv` | one row per batch |

pub mod host;
pub mod results;
pub mod stats;

pub use host::*;
pub use results::*;
pub use stats::*;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const RESULTS_FILE: &str = "sentiment_results_ollama_optimized.csv";
pub const RESULTS_FULL_FILE: &str = "sentiment_results_ollama_optimized_full.csv";
pub const RUN_STATS_FILE: &str = "run_stats_ollama_optimized.json";
pub const BATCH_STATS_FILE: &str = "batch_stats_ollama_optimized.csv";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error writing {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Create `dir` if needed and return `dir/name`.
fn output_path(dir: &Path, name: &str) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(dir.join(name))
}

/// CSV writer with headers written explicitly, so an empty table still has them.
fn csv_writer(path: &Path, header: &[&str]) -> Result<csv::Writer<std::fs::File>, ReportError> {
    let csv_err = |source: csv::Error| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;
    writer.write_record(header).map_err(csv_err)?;
    Ok(writer)
}
