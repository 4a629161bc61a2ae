//! sentiment-batch - command-line entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use sentiment_batch::config::{self, ConfigOverrides};
use sentiment_batch::engine;

/// Classify customer sentiment of contact-centre conversations with a local Ollama model
#[derive(Parser, Debug)]
#[command(name = "sentiment-batch")]
#[command(version)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Input CSV with conversation_id, turn_index, role, text columns
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Process only the first N conversations
    #[arg(short = 'n', long, conflicts_with = "all")]
    pub max_conversations: Option<usize>,

    /// Process every conversation in the input
    #[arg(long)]
    pub all: bool,

    /// Conversations per batch
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: Option<u64>,

    /// Maximum simultaneous inference calls
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: Option<u64>,

    /// Ollama generate endpoint URL
    #[arg(long)]
    pub url: Option<String>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Directory for result and stats files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Skip CPU/memory sampling after the run
    #[arg(long)]
    pub no_host_metrics: bool,

    /// Debug-level logging (ignored when RUST_LOG is set)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let max_conversations = if self.all {
            Some(None)
        } else {
            self.max_conversations.map(Some)
        };
        ConfigOverrides {
            csv_path: self.input.clone(),
            max_conversations,
            batch_size: self.batch_size.map(|v| v as usize),
            concurrency_limit: self.concurrency.map(|v| v as usize),
            url: self.url.clone(),
            model: self.model.clone(),
            output_dir: self.output_dir.clone(),
            host_metrics: self.no_host_metrics.then_some(false),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    sentiment_batch::init_tracing(args.verbose);

    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let config = match config::resolve(args.config.as_deref(), args.overrides()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Configuration error");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match engine::run(&config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_does_not_error() {
        let err = Args::try_parse_from(["sentiment-batch", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn version_does_not_error() {
        let err = Args::try_parse_from(["sentiment-batch", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn no_args_overrides_nothing() {
        let args = Args::parse_from(["sentiment-batch"]);
        let o = args.overrides();
        assert!(o.csv_path.is_none());
        assert!(o.max_conversations.is_none());
        assert!(o.batch_size.is_none());
        assert!(o.concurrency_limit.is_none());
        assert!(o.url.is_none());
        assert!(o.model.is_none());
        assert!(o.output_dir.is_none());
        assert!(o.host_metrics.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn flags_map_to_overrides() {
        let args = Args::parse_from([
            "sentiment-batch",
            "--input",
            "convs.csv",
            "-n",
            "50",
            "--batch-size",
            "16",
            "--concurrency",
            "2",
            "--url",
            "http://gpu-box:11434/api/generate",
            "--model",
            "mistral",
            "--output-dir",
            "out",
            "--no-host-metrics",
        ]);
        let o = args.overrides();
        assert_eq!(o.csv_path, Some(PathBuf::from("convs.csv")));
        assert_eq!(o.max_conversations, Some(Some(50)));
        assert_eq!(o.batch_size, Some(16));
        assert_eq!(o.concurrency_limit, Some(2));
        assert_eq!(o.url.as_deref(), Some("http://gpu-box:11434/api/generate"));
        assert_eq!(o.model.as_deref(), Some("mistral"));
        assert_eq!(o.output_dir, Some(PathBuf::from("out")));
        assert_eq!(o.host_metrics, Some(false));
    }

    #[test]
    fn all_removes_cap() {
        let args = Args::parse_from(["sentiment-batch", "--all"]);
        assert_eq!(args.overrides().max_conversations, Some(None));
    }

    #[test]
    fn all_conflicts_with_max_conversations() {
        let err = Args::try_parse_from(["sentiment-batch", "--all", "-n", "5"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = Args::try_parse_from(["sentiment-batch", "--batch-size", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
