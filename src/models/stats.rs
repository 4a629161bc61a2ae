use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Records per second, or `0.0` when no time elapsed.
pub fn throughput(records: usize, duration_sec: f64) -> f64 {
    if duration_sec > 0.0 {
        records as f64 / duration_sec
    } else {
        0.0
    }
}

/// Timing of one dispatched batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStat {
    /// 1-based, assigned in the order batches are formed.
    pub batch_index: usize,
    pub records: usize,
    pub duration_sec: f64,
    pub throughput_conv_per_sec: f64,
}

impl BatchStat {
    pub fn new(batch_index: usize, records: usize, duration_sec: f64) -> Self {
        Self {
            batch_index,
            records,
            duration_sec,
            throughput_conv_per_sec: throughput(records, duration_sec),
        }
    }
}

/// Aggregate timing for a whole run.
///
/// Built incrementally by the dispatcher, finalized with [`RunStats::finish`],
/// then optionally enriched with [`HostMetrics`] before it is written out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub model: String,
    pub total_conversations: usize,
    pub batch_size: usize,
    pub concurrency_limit: usize,
    pub batches: Vec<BatchStat>,
    pub total_duration_sec: f64,
    pub overall_throughput_conv_per_sec: f64,
    pub failed_conversations: usize,
    #[serde(flatten)]
    pub host: Option<HostMetrics>,
}

impl RunStats {
    pub fn begin(
        model: &str,
        total_conversations: usize,
        batch_size: usize,
        concurrency_limit: usize,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            model: model.to_string(),
            total_conversations,
            batch_size,
            concurrency_limit,
            batches: Vec::new(),
            total_duration_sec: 0.0,
            overall_throughput_conv_per_sec: 0.0,
            failed_conversations: 0,
            host: None,
        }
    }

    pub fn push_batch(&mut self, stat: BatchStat) {
        self.batches.push(stat);
    }

    pub fn finish(&mut self, total_duration_sec: f64, failed_conversations: usize) {
        self.total_duration_sec = total_duration_sec;
        self.overall_throughput_conv_per_sec =
            throughput(self.total_conversations, total_duration_sec);
        self.failed_conversations = failed_conversations;
    }
}

/// Host snapshot attached to the stats document after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMetrics {
    pub system_info: SystemInfo,
    pub cpu_percent_after_run: f32,
    pub memory_info: MemoryInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub platform: String,
    pub cpu_count_logical: usize,
    pub cpu_count_physical: Option<usize>,
}

/// Memory figures in GiB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total_gb: f64,
    pub available_gb: f64,
    pub used_gb: f64,
    pub percent_used: f64,
}
