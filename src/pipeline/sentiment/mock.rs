//! Scripted inference backend for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::types::{GenerateBackend, GenerateRequest};
use super::SentimentError;

/// What the mock does for one call.
pub enum MockReply {
    Text(String),
    Fail(SentimentError),
    /// Sleep on the (tokio) clock, then behave like the inner reply.
    Delayed(Duration, Box<MockReply>),
}

impl MockReply {
    pub fn text(s: &str) -> Self {
        Self::Text(s.to_string())
    }

    pub fn after(delay: Duration, reply: MockReply) -> Self {
        Self::Delayed(delay, Box::new(reply))
    }
}

/// Backend whose replies come from a closure `(prompt, call_number) -> MockReply`.
///
/// `call_number` is 1-based and counted per distinct prompt, so a script can
/// fail the first attempts of one conversation and succeed later.
pub struct MockBackend<F> {
    script: F,
    calls_per_prompt: Mutex<HashMap<String, u32>>,
    total_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl<F> MockBackend<F>
where
    F: Fn(&str, u32) -> MockReply + Send + Sync,
{
    pub fn new(script: F) -> Self {
        Self {
            script,
            calls_per_prompt: Mutex::new(HashMap::new()),
            total_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `generate` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the call is cancelled by a timeout.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<F> GenerateBackend for MockBackend<F>
where
    F: Fn(&str, u32) -> MockReply + Send + Sync,
{
    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, SentimentError> {
        let call = {
            let mut calls = self.calls_per_prompt.lock().unwrap();
            let count = calls.entry(request.prompt.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let mut reply = (self.script)(request.prompt, call);
        loop {
            match reply {
                MockReply::Text(text) => return Ok(text),
                MockReply::Fail(err) => return Err(err),
                MockReply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}
