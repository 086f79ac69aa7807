//! Mock summarization backend for testing.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Notify, Semaphore};

use super::{Summarizer, SummarizerError};
use crate::LengthBounds;

/// A configurable mock response for [`MockSummarizer`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Always return this text.
    Text(String),
    /// Return the first `max_tokens / 2` words of the input (at least one).
    /// Deterministic in both text and bounds.
    LeadingWords,
    /// Fail with [`SummarizerError::Api`].
    Error(String),
}

/// Holds every call made through a gated [`MockSummarizer`] until released.
///
/// Lets a test know a call is in progress (and stays in progress) without
/// relying on timing.
pub struct MockGate {
    entered: Notify,
    release: Semaphore,
}

impl Default for MockGate {
    fn default() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }
}

impl MockGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wait until a call has entered the gate. An entry made while nobody
    /// waits is remembered, but only one.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let `calls` held or future calls through.
    pub fn release(&self, calls: usize) {
        self.release.add_permits(calls);
    }

    async fn pass(&self) {
        self.entered.notify_one();
        if let Ok(permit) = self.release.acquire().await {
            permit.forget();
        }
    }
}

/// A hand-rolled mock implementing [`Summarizer`] for tests.
///
/// Supports:
/// - A fixed response mode (see [`MockResponse`]).
/// - Optional per-call latency, or a [`MockGate`] holding calls open.
/// - Call counting and a record of the bounds of the last call.
/// - Tracking of the highest number of calls in flight at once.
pub struct MockSummarizer {
    response: MockResponse,
    delay: Option<Duration>,
    gate: Option<Arc<MockGate>>,
    call_count: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_bounds: Mutex<Option<LengthBounds>>,
}

impl MockSummarizer {
    pub fn new(response: MockResponse) -> Self {
        Self {
            response,
            delay: None,
            gate: None,
            call_count: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            last_bounds: Mutex::new(None),
        }
    }

    /// Shorthand for [`MockResponse::Text`].
    pub fn text(summary: impl Into<String>) -> Self {
        Self::new(MockResponse::Text(summary.into()))
    }

    /// Shorthand for [`MockResponse::Error`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockResponse::Error(message.into()))
    }

    /// Set simulated inference latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold each call at `gate` before responding.
    pub fn with_gate(mut self, gate: Arc<MockGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// How many times `summarize()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent `summarize()` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Bounds passed to the most recent call.
    pub fn last_bounds(&self) -> Option<LengthBounds> {
        *self.last_bounds.lock().unwrap()
    }

    fn respond(&self, text: &str, bounds: LengthBounds) -> Result<String, SummarizerError> {
        match &self.response {
            MockResponse::Text(s) => Ok(s.clone()),
            MockResponse::LeadingWords => {
                let take = (bounds.max_tokens as usize / 2).max(1);
                let words: Vec<&str> = text.split_whitespace().take(take).collect();
                if words.is_empty() {
                    Err(SummarizerError::EmptyOutput)
                } else {
                    Ok(words.join(" "))
                }
            }
            MockResponse::Error(msg) => Err(SummarizerError::Api(msg.clone())),
        }
    }
}

impl Summarizer for MockSummarizer {
    fn name(&self) -> &str {
        "mock"
    }

    fn summarize<'a>(
        &'a self,
        text: &'a str,
        bounds: LengthBounds,
    ) -> Pin<Box<dyn Future<Output = Result<String, SummarizerError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_bounds.lock().unwrap() = Some(bounds);
        let delay = self.delay;

        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(gate) = &self.gate {
                gate.pass().await;
            }
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            let result = self.respond(text, bounds);

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}
