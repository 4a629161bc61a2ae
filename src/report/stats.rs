use std::path::{Path, PathBuf};

use super::{csv_writer, output_path, ReportError, BATCH_STATS_FILE, RUN_STATS_FILE};
use crate::models::RunStats;

const BATCH_HEADER: [&str; 4] = [
    "batch_index",
    "records",
    "duration_sec",
    "throughput_conv_per_sec",
];

/// Paths of the stats document and the per-batch table.
#[derive(Debug, Clone)]
pub struct StatsFiles {
    pub run_stats: PathBuf,
    pub batch_stats: PathBuf,
}

/// Write the run statistics as pretty JSON plus a per-batch CSV.
pub fn write_run_stats(dir: &Path, stats: &RunStats) -> Result<StatsFiles, ReportError> {
    let run_stats = output_path(dir, RUN_STATS_FILE)?;
    let json = serde_json::to_string_pretty(stats)?;
    std::fs::write(&run_stats, json).map_err(|source| ReportError::Io {
        path: run_stats.clone(),
        source,
    })?;
    tracing::info!(path = %run_stats.display(), "Saved run stats");

    let batch_stats = output_path(dir, BATCH_STATS_FILE)?;
    let mut writer = csv_writer(&batch_stats, &BATCH_HEADER)?;
    for batch in &stats.batches {
        writer.serialize(batch).map_err(|source| ReportError::Csv {
            path: batch_stats.clone(),
            source,
        })?;
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: batch_stats.clone(),
        source,
    })?;
    tracing::info!(
        path = %batch_stats.display(),
        batches = stats.batches.len(),
        "Saved batch stats"
    );

    Ok(StatsFiles {
        run_stats,
        batch_stats,
    })
}
