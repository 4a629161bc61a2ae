pub mod config;
pub mod engine;
pub mod models;
pub mod pipeline;
pub mod report;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise [`config::default_log_filter`],
/// raised to `debug` by `verbose`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "sentiment_batch=debug"
    } else {
        config::default_log_filter()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .init();
}
