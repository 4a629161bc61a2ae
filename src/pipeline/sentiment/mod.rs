pub mod client;
#[cfg(test)]
pub mod mock;
pub mod ollama;
pub mod parser;
pub mod prompt;
pub mod types;

pub use client::*;
pub use ollama::*;
pub use parser::*;
pub use prompt::*;
pub use types::*;

use std::time::Duration;

use thiserror::Error;

/// Transport-level failure of a single inference attempt.
///
/// These are the retryable failures; the `Display` text of the last one is
/// what ends up in `SentimentResult::error` once retries run out.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SentimentError {
    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Concurrency limiter closed")]
    LimiterClosed,
}
