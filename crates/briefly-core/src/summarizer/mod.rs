//! Summarization backend trait and implementations.

pub mod http;
pub mod mock;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::LengthBounds;

pub use http::HttpSummarizer;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("request to summarization backend failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("summarization backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("summarization backend reported an error: {0}")]
    Api(String),
    #[error("unexpected response from summarization backend: {0}")]
    Malformed(String),
    #[error("summarization backend returned an empty summary")]
    EmptyOutput,
}

/// An abstractive summarization model.
///
/// Implementations must decode deterministically (no sampling) so that the
/// same text and bounds always yield the same summary. A single instance is
/// shared by every request and may be called concurrently.
pub trait Summarizer: Send + Sync {
    /// Name of the model behind this backend (for logs and `/health`).
    fn name(&self) -> &str;

    /// Summarize `text` within `bounds`. Inverted bounds must be tolerated.
    fn summarize<'a>(
        &'a self,
        text: &'a str,
        bounds: LengthBounds,
    ) -> Pin<Box<dyn Future<Output = Result<String, SummarizerError>> + Send + 'a>>;
}
