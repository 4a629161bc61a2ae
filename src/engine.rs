//! End-to-end run: load → dispatch → sinks.

use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::models::{RunStats, SentimentResult};
use crate::pipeline::batch::BatchDispatcher;
use crate::pipeline::conversations::{load_conversations, LoadError};
use crate::pipeline::sentiment::{InferenceClient, OllamaBackend, SentimentError};
use crate::report::{self, ReportError};

/// Fatal run errors. Per-conversation failures never end up here.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Cannot create inference backend: {0}")]
    Backend(#[from] SentimentError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Run the whole pipeline for a resolved config.
///
/// Both result tables and both stats files are written before returning,
/// even when every conversation failed.
pub async fn run(config: &AppConfig) -> Result<(Vec<SentimentResult>, RunStats), EngineError> {
    config.validate()?;

    let conversations = load_conversations(&config.csv_path, config.max_conversations)?;

    let backend = OllamaBackend::new(
        &config.ollama.url,
        config.ollama.retry.timeout,
        config.dispatch.concurrency_limit,
    )?;
    tracing::info!(url = backend.url(), model = %config.ollama.model, "Using Ollama endpoint");

    let client = InferenceClient::new(
        backend,
        &config.ollama.model,
        config.ollama.options,
        &config.ollama.prompt_template,
        config.excerpt,
        config.ollama.retry,
    );
    let dispatcher = BatchDispatcher::new(client, config.dispatch);

    let (results, mut stats) = dispatcher.run(&conversations).await;

    report::write_results(&config.output_dir, &results)?;
    if config.host_metrics {
        report::enrich_run_stats(&mut stats).await;
    }
    report::write_run_stats(&config.output_dir, &stats)?;

    tracing::info!(
        conversations = results.len(),
        failed = stats.failed_conversations,
        output_dir = %config.output_dir.display(),
        "Done"
    );

    Ok((results, stats))
}
