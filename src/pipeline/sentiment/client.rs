//! InferenceClient: one sentiment call per conversation, with retry.
//!
//! Retry policy:
//! - transport failures (connection, timeout, bad status, undecodable body) are
//!   retried with linear backoff `backoff_base × attempt`, no jitter
//! - a reply that arrives but holds no JSON object is final (`json_parse_failed`)
//! - every outcome is returned as a [`SentimentResult`]; nothing is propagated

use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::Instant;

use super::parser::{parse_sentiment_reply, ParsedSentiment};
use super::prompt::render_prompt;
use super::types::{GenerateBackend, GenerateRequest, GenerationOptions};
use super::SentimentError;
use crate::models::{Conversation, SentimentResult, JSON_PARSE_FAILED, UNEXPECTED_FALLTHROUGH};
use crate::pipeline::conversations::{format_customer_only, ExcerptLimits};

/// Attempt budget, per-attempt timeout and backoff step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    pub timeout: Duration,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based). Saturates instead of overflowing.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout: Duration::from_secs(60),
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Result of a single attempt, before the retry loop decides what to do.
enum AttemptOutcome {
    Parsed { reply: ParsedSentiment, raw: String },
    Unparseable { raw: String },
    Transport(SentimentError),
}

/// Sends one conversation at a time to the inference backend.
pub struct InferenceClient<B> {
    backend: B,
    model: String,
    options: GenerationOptions,
    prompt_template: String,
    excerpt: ExcerptLimits,
    retry: RetryPolicy,
}

impl<B: GenerateBackend> InferenceClient<B> {
    pub fn new(
        backend: B,
        model: &str,
        options: GenerationOptions,
        prompt_template: &str,
        excerpt: ExcerptLimits,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            model: model.to_string(),
            options,
            prompt_template: prompt_template.to_string(),
            excerpt,
            retry: RetryPolicy {
                max_retries: retry.max_retries.max(1),
                ..retry
            },
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Classify one conversation. Always returns a result.
    ///
    /// `limiter` is the run-wide concurrency ceiling; a permit is held only
    /// while a request is in flight, not during backoff.
    pub async fn analyze_one(
        &self,
        conversation: &Conversation,
        limiter: &Semaphore,
    ) -> SentimentResult {
        let excerpt = format_customer_only(conversation, &self.excerpt);
        let prompt = render_prompt(&self.prompt_template, &excerpt);
        let request = GenerateRequest::new(&self.model, &prompt, self.options);
        let id = conversation.conversation_id.as_str();

        let started = Instant::now();
        let max_retries = self.retry.max_retries;

        for attempt in 1..=max_retries {
            match self.attempt(&request, limiter).await {
                AttemptOutcome::Parsed { reply, raw } => {
                    return SentimentResult {
                        conversation_id: id.to_string(),
                        sentiment: reply.sentiment,
                        score: reply.score,
                        summary: reply.summary,
                        raw_model_output: Some(raw),
                        attempts: attempt,
                        latency_sec: started.elapsed().as_secs_f64(),
                        error: None,
                    };
                }
                AttemptOutcome::Unparseable { raw } => {
                    tracing::warn!(
                        conversation_id = id,
                        attempt,
                        "Could not parse sentiment JSON from model reply"
                    );
                    return SentimentResult::failure(
                        id,
                        JSON_PARSE_FAILED,
                        Some(raw),
                        attempt,
                        started.elapsed().as_secs_f64(),
                    );
                }
                AttemptOutcome::Transport(err) => {
                    tracing::warn!(
                        conversation_id = id,
                        attempt,
                        max_retries,
                        error = %err,
                        "Inference attempt failed"
                    );
                    if attempt == max_retries {
                        return SentimentResult::failure(
                            id,
                            err.to_string(),
                            None,
                            attempt,
                            started.elapsed().as_secs_f64(),
                        );
                    }
                    tokio::time::sleep(self.retry.backoff_for(attempt)).await;
                }
            }
        }

        // Unreachable: max_retries >= 1 and the final attempt always returns.
        tracing::error!(conversation_id = id, "Retry loop exited without a result");
        SentimentResult::failure(
            id,
            UNEXPECTED_FALLTHROUGH,
            None,
            max_retries,
            started.elapsed().as_secs_f64(),
        )
    }

    async fn attempt(&self, request: &GenerateRequest<'_>, limiter: &Semaphore) -> AttemptOutcome {
        let reply = {
            let Ok(_permit) = limiter.acquire().await else {
                return AttemptOutcome::Transport(SentimentError::LimiterClosed);
            };
            tokio::time::timeout(self.retry.timeout, self.backend.generate(request)).await
        };

        let raw = match reply {
            Ok(Ok(text)) => text.trim().to_string(),
            Ok(Err(e)) => return AttemptOutcome::Transport(e),
            Err(_) => return AttemptOutcome::Transport(SentimentError::Timeout(self.retry.timeout)),
        };

        match parse_sentiment_reply(&raw) {
            Some(reply) => AttemptOutcome::Parsed { reply, raw },
            None => AttemptOutcome::Unparseable { raw },
        }
    }
}
