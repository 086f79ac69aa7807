//! Markdown rendering of pipeline results.
//!
//! Every message starts with a marker front-ends can rely on: `✅` for a
//! summary, `⚠️` for a correctable warning, `❌` for an error.

use std::fmt;

use serde::Serialize;

use crate::{SummarizeError, SummaryReport};

pub const SUCCESS_MARKER: &str = "✅";
pub const WARNING_MARKER: &str = "⚠️";
pub const ERROR_MARKER: &str = "❌";

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Warning,
    Error,
}

impl Outcome {
    pub fn of(result: &Result<SummaryReport, SummarizeError>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(e) if e.is_warning() => Outcome::Warning,
            Err(_) => Outcome::Error,
        }
    }
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} **Source**: {}", SUCCESS_MARKER, self.source)?;
        writeln!(f, "🧾 **Input Length**: {} characters", self.input_chars)?;
        writeln!(
            f,
            "📏 **Target Summary Length**: {} words (≈ {}-{} tokens)",
            self.requested_words, self.bounds.min_tokens, self.bounds.max_tokens
        )?;
        writeln!(f)?;
        writeln!(f, "### 🧠 Summary:")?;
        write!(f, "{}", self.summary)
    }
}

/// Render an error or warning as a user-facing message.
pub fn render_error(err: &SummarizeError) -> String {
    match err {
        SummarizeError::InsufficientInput { chars } => format!(
            "{} {}\n\n📝 Current Input Length: {} characters.",
            WARNING_MARKER, err, chars
        ),
        _ => format!("{} {}", ERROR_MARKER, err),
    }
}

/// Render a pipeline result as Markdown.
pub fn render(result: &Result<SummaryReport, SummarizeError>) -> String {
    match result {
        Ok(report) => report.to_string(),
        Err(e) => render_error(e),
    }
}
