//! BatchDispatcher: runs every conversation through the inference client,
//! batch by batch, and records timing.

use tokio::sync::Semaphore;
use tokio::time::Instant;

use super::DispatchConfig;
use crate::models::{BatchStat, Conversation, RunStats, SentimentResult};
use crate::pipeline::sentiment::{GenerateBackend, InferenceClient};

/// Contiguous batches of at most `batch_size` conversations.
/// A `batch_size` of 0 is treated as 1.
pub fn chunk_conversations(
    conversations: &[Conversation],
    batch_size: usize,
) -> std::slice::Chunks<'_, Conversation> {
    conversations.chunks(batch_size.max(1))
}

/// Number of batches `total` conversations split into.
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    total.div_ceil(batch_size.max(1))
}

/// Orchestrates a full run.
pub struct BatchDispatcher<B> {
    client: InferenceClient<B>,
    config: DispatchConfig,
}

impl<B: GenerateBackend> BatchDispatcher<B> {
    pub fn new(client: InferenceClient<B>, config: DispatchConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &InferenceClient<B> {
        &self.client
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Classify every conversation.
    ///
    /// Results come back in input order. Individual failures are recorded in
    /// their result and never stop the run.
    pub async fn run(&self, conversations: &[Conversation]) -> (Vec<SentimentResult>, RunStats) {
        let batch_size = self.config.batch_size.max(1);
        let concurrency_limit = self.config.concurrency_limit.max(1);
        let total = conversations.len();
        let num_batches = batch_count(total, batch_size);

        let mut stats = RunStats::begin(self.client.model(), total, batch_size, concurrency_limit);
        let mut results = Vec::with_capacity(total);
        let limiter = Semaphore::new(concurrency_limit);

        tracing::info!(
            total,
            batch_size,
            concurrency_limit,
            num_batches,
            model = self.client.model(),
            "Starting sentiment run"
        );

        let run_start = Instant::now();

        for (i, batch) in chunk_conversations(conversations, batch_size).enumerate() {
            let batch_index = i + 1;
            tracing::info!(
                batch_index,
                num_batches,
                "Processing batch {batch_index} ({} conversations)",
                batch.len()
            );

            let batch_start = Instant::now();
            let calls = batch
                .iter()
                .map(|conversation| self.client.analyze_one(conversation, &limiter));
            let batch_results = futures_util::future::join_all(calls).await;
            let duration_sec = batch_start.elapsed().as_secs_f64();

            let stat = BatchStat::new(batch_index, batch_results.len(), duration_sec);
            let failed = batch_results.iter().filter(|r| !r.is_success()).count();
            tracing::info!(
                batch_index,
                records = stat.records,
                failed,
                processed = results.len() + batch_results.len(),
                total,
                duration_sec = stat.duration_sec,
                throughput = stat.throughput_conv_per_sec,
                "Finished batch"
            );

            results.extend(batch_results);
            stats.push_batch(stat);
        }

        let total_duration = run_start.elapsed().as_secs_f64();
        let failed = results.iter().filter(|r| !r.is_success()).count();
        stats.finish(total_duration, failed);

        tracing::info!(
            total,
            failed,
            duration_sec = stats.total_duration_sec,
            throughput = stats.overall_throughput_conv_per_sec,
            "Sentiment run complete"
        );

        (results, stats)
    }
}
