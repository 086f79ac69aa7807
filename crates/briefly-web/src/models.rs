use serde::Serialize;

use briefly_core::{Outcome, SummaryReport, report};

/// Response body of `POST /summarize`.
#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub status: Outcome,
    /// The rendered message, exactly as shown to users.
    pub markdown: String,
    pub report: Option<SummaryReport>,
}

impl SummarizeResponse {
    pub fn from_result(result: Result<SummaryReport, briefly_core::SummarizeError>) -> Self {
        let status = Outcome::of(&result);
        let markdown = report::render(&result);
        Self {
            status,
            markdown,
            report: result.ok(),
        }
    }

    /// A form that could not be read at all.
    pub fn bad_request(message: &str) -> Self {
        Self {
            status: Outcome::Error,
            markdown: format!("{} {}", report::ERROR_MARKER, message),
            report: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub workers: usize,
    pub queued: usize,
}
