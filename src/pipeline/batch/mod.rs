//! Batch dispatch: fixed-size batches processed one after another, with a
//! bounded fan-out of inference calls inside each batch.
//!
//! ```text
//! conversations → chunk(batch_size) → [batch 1] → [batch 2] → ... → (results, RunStats)
//!                                         │
//!                                         └─ join_all(analyze_one) ── Semaphore(concurrency_limit)
//! ```
//!
//! The semaphore is created once per run and shared by every batch, so the
//! in-flight ceiling holds across the whole run.

pub mod runner;

pub use runner::*;

use serde::{Deserialize, Serialize};

/// Batch shape and in-flight ceiling for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Conversations per batch (>= 1).
    pub batch_size: usize,
    /// Maximum simultaneous inference calls across the run (>= 1).
    pub concurrency_limit: usize,
}
