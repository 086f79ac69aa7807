use std::sync::Arc;
use std::time::Instant;

use crate::article::ArticleFetcher;
use crate::length::estimate_bounds;
use crate::pdf::{PdfBackend, extract_pdf_text};
use crate::summarizer::Summarizer;
use crate::{InputBundle, MIN_INPUT_CHARS, SourceKind, SummarizeError, SummaryReport, UploadedFile, report};

/// The input chosen for a request, before extraction.
#[derive(Debug)]
pub enum Source {
    Pdf(UploadedFile),
    Url(String),
    Text(String),
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Pdf(_) => SourceKind::Pdf,
            Source::Url(_) => SourceKind::Url,
            Source::Text(_) => SourceKind::Text,
        }
    }
}

/// Pick the single source a request will use.
///
/// A file always wins, then a URL that is non-blank after trimming, then the
/// text box (absent text counts as empty).
pub fn select_source(input: InputBundle) -> Source {
    if let Some(file) = input.file {
        return Source::Pdf(file);
    }
    if let Some(url) = input.url
        && !url.trim().is_empty()
    {
        return Source::Url(url);
    }
    Source::Text(input.text.unwrap_or_default())
}

/// The summarization pipeline: source selection, extraction, validation,
/// length estimation, and the backend call.
///
/// Holds only shared read-only handles, so one `Pipeline` serves any number
/// of concurrent requests.
pub struct Pipeline {
    summarizer: Arc<dyn Summarizer>,
    pdf: Arc<dyn PdfBackend>,
    fetcher: ArticleFetcher,
}

impl Pipeline {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        pdf: Arc<dyn PdfBackend>,
        fetcher: ArticleFetcher,
    ) -> Self {
        Self {
            summarizer,
            pdf,
            fetcher,
        }
    }

    /// Run one request end to end.
    pub async fn run(&self, input: InputBundle) -> Result<SummaryReport, SummarizeError> {
        let start = Instant::now();
        let word_length = input.word_length;
        let source = select_source(input);
        let kind = source.kind();

        let result = self.run_source(source, word_length).await;

        match &result {
            Ok(report) => tracing::info!(
                source = %kind,
                input_chars = report.input_chars,
                min_tokens = report.bounds.min_tokens,
                max_tokens = report.bounds.max_tokens,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "summary complete"
            ),
            Err(e) if e.is_warning() => tracing::info!(source = %kind, warning = %e, "input too short"),
            Err(e) => tracing::warn!(
                source = %kind,
                error = %e,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "summary failed"
            ),
        }
        result
    }

    /// [`Pipeline::run`] rendered as the Markdown string shown to users.
    pub async fn summarize_input(
        &self,
        text: Option<String>,
        url: Option<String>,
        file: Option<UploadedFile>,
        word_length: u32,
    ) -> String {
        let input = InputBundle {
            text,
            url,
            file,
            word_length,
        };
        report::render(&self.run(input).await)
    }

    async fn run_source(
        &self,
        source: Source,
        word_length: u32,
    ) -> Result<SummaryReport, SummarizeError> {
        let kind = source.kind();
        let text = self.extract(source).await?;

        let input_chars = text.trim().chars().count();
        if input_chars < MIN_INPUT_CHARS {
            return Err(SummarizeError::InsufficientInput { chars: input_chars });
        }

        let bounds = estimate_bounds(word_length);

        let summary = self
            .summarizer
            .summarize(&text, bounds)
            .await
            .map_err(|e| SummarizeError::Summarization(e.to_string()))?;

        Ok(SummaryReport {
            source: kind,
            input_chars,
            requested_words: word_length,
            bounds,
            summary,
        })
    }

    async fn extract(&self, source: Source) -> Result<String, SummarizeError> {
        match source {
            Source::Text(text) => Ok(text),
            Source::Url(url) => self.fetcher.fetch(&url).await.map(|article| article.text),
            Source::Pdf(file) => {
                // MuPDF is blocking; keep it off the async workers.
                let pdf = Arc::clone(&self.pdf);
                tokio::task::spawn_blocking(move || extract_pdf_text(pdf.as_ref(), &file))
                    .await
                    .map_err(|e| SummarizeError::ExtractionDispatch(e.to_string()))?
            }
        }
    }
}
