use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub mod article;
pub mod config_file;
pub mod length;
pub mod orchestrator;
pub mod pdf;
pub mod pool;
pub mod report;
pub mod summarizer;

// Re-export for convenience
pub use article::{Article, ArticleFetcher};
pub use length::{
    LengthBounds, WORD_LENGTH_DEFAULT, WORD_LENGTH_MAX, WORD_LENGTH_MIN, WORD_LENGTH_STEP,
    estimate_bounds,
};
pub use orchestrator::Pipeline;
pub use pdf::{PdfBackend, PdfError};
pub use pool::{PoolError, SummaryPool};
pub use report::{Outcome, render};
pub use summarizer::{HttpSummarizer, Summarizer, SummarizerError};

/// Inputs shorter than this (trimmed, in characters) are sent back with a warning.
pub const MIN_INPUT_CHARS: usize = 30;

/// Default Hugging Face model used when no endpoint is configured.
pub const DEFAULT_MODEL: &str = "facebook/bart-large-cnn";

/// Base URL of the hosted inference API; the model id is appended.
pub const HF_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/models";

/// Where the text being summarized came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Text,
    Url,
    Pdf,
}

impl SourceKind {
    /// Label shown to users in the report.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Text => "Textbox",
            SourceKind::Url => "URL",
            SourceKind::Pdf => "PDF",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An uploaded file with its name and raw bytes.
#[derive(Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// The four inputs of one summarization request.
///
/// All three sources may be set at once; [`Pipeline::run`] decides which one
/// is used (file, then URL, then text).
#[derive(Debug, Clone)]
pub struct InputBundle {
    pub text: Option<String>,
    pub url: Option<String>,
    pub file: Option<UploadedFile>,
    pub word_length: u32,
}

impl Default for InputBundle {
    fn default() -> Self {
        Self {
            text: None,
            url: None,
            file: None,
            word_length: WORD_LENGTH_DEFAULT,
        }
    }
}

impl InputBundle {
    pub fn new(word_length: u32) -> Self {
        Self {
            word_length,
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.file = Some(file);
        self
    }
}

/// A successful summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    pub source: SourceKind,
    /// Characters in the trimmed input text.
    pub input_chars: usize,
    pub requested_words: u32,
    /// Bounds as computed from `requested_words`, before any clamping.
    pub bounds: LengthBounds,
    pub summary: String,
}

/// Everything that can end a summarization request early.
///
/// `Display` yields the user-facing message without its marker;
/// [`report::render`] adds the marker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummarizeError {
    #[error("Invalid URL format. Please include http or https.")]
    InvalidUrlFormat,
    #[error("No text found in the article.")]
    EmptyArticleText,
    #[error("Error extracting from URL: {0}")]
    UrlFetch(String),
    #[error("Invalid file format. Only PDFs are supported.")]
    InvalidFileFormat,
    #[error("No text found in PDF.")]
    EmptyPdfText,
    #[error("Error reading PDF: {0}")]
    PdfParse(String),
    #[error("Failed to extract input: {0}")]
    ExtractionDispatch(String),
    /// Not a hard failure: the user can add more text and retry.
    #[error("Please provide at least 30 characters of valid content.")]
    InsufficientInput { chars: usize },
    #[error("Summarization failed: {0}")]
    Summarization(String),
    #[error("The summarizer is busy. Please try again shortly.")]
    Busy,
}

impl SummarizeError {
    pub fn is_warning(&self) -> bool {
        matches!(self, SummarizeError::InsufficientInput { .. })
    }
}

/// Resolved runtime configuration.
#[derive(Clone)]
pub struct Config {
    /// Model id, used for display and to derive the default endpoint.
    pub model: String,
    /// Full URL of the summarization endpoint.
    pub endpoint: String,
    pub api_token: Option<String>,
    pub backend_timeout_secs: u64,
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    /// Listen address of the web front-end.
    pub bind: String,
    pub num_workers: usize,
    pub queue_capacity: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("backend_timeout_secs", &self.backend_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("bind", &self.bind)
            .field("num_workers", &self.num_workers)
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: default_endpoint(DEFAULT_MODEL),
            api_token: None,
            backend_timeout_secs: 120,
            user_agent: format!(
                "Mozilla/5.0 (compatible; briefly/{})",
                env!("CARGO_PKG_VERSION")
            ),
            fetch_timeout_secs: 30,
            bind: "0.0.0.0:7860".to_string(),
            num_workers: 2,
            queue_capacity: 16,
        }
    }
}

/// Hosted inference URL for a model id.
pub fn default_endpoint(model: &str) -> String {
    format!("{}/{}", HF_INFERENCE_BASE, model.trim_matches('/'))
}

impl Config {
    /// Build a config from file values layered over defaults, then
    /// environment values (looked up through `env`) layered over that.
    ///
    /// Recognized variables: `BRIEFLY_MODEL`, `BRIEFLY_ENDPOINT`,
    /// `BRIEFLY_API_TOKEN` (falls back to `HF_API_TOKEN`), `BRIEFLY_BIND`,
    /// `BRIEFLY_WORKERS`.
    pub fn resolve(
        file: &config_file::ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let defaults = Config::default();
        let backend = file.backend.clone().unwrap_or_default();
        let fetch = file.fetch.clone().unwrap_or_default();
        let server = file.server.clone().unwrap_or_default();
        let env = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let model = env("BRIEFLY_MODEL")
            .or(backend.model)
            .unwrap_or(defaults.model);
        let endpoint = env("BRIEFLY_ENDPOINT")
            .or(backend.endpoint)
            .unwrap_or_else(|| default_endpoint(&model));
        let api_token = env("BRIEFLY_API_TOKEN")
            .or_else(|| env("HF_API_TOKEN"))
            .or(backend.api_token);
        let num_workers = env("BRIEFLY_WORKERS")
            .and_then(|v| v.parse().ok())
            .or(server.num_workers)
            .unwrap_or(defaults.num_workers)
            .max(1);

        Self {
            model,
            endpoint,
            api_token,
            backend_timeout_secs: backend
                .timeout_secs
                .unwrap_or(defaults.backend_timeout_secs),
            user_agent: fetch.user_agent.unwrap_or(defaults.user_agent),
            fetch_timeout_secs: fetch.timeout_secs.unwrap_or(defaults.fetch_timeout_secs),
            bind: env("BRIEFLY_BIND")
                .or(server.bind)
                .unwrap_or(defaults.bind),
            num_workers,
            queue_capacity: server
                .queue_capacity
                .unwrap_or(defaults.queue_capacity)
                .max(1),
        }
    }

    /// [`Config::resolve`] against the process environment.
    pub fn from_env(file: &config_file::ConfigFile) -> Self {
        Self::resolve(file, |key| std::env::var(key).ok())
    }
}
