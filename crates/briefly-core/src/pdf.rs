use thiserror::Error;

use crate::{SummarizeError, UploadedFile};

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("failed to open PDF: {0}")]
    Open(String),
    #[error("failed to extract text: {0}")]
    Extraction(String),
}

/// Trait for PDF text extraction backends.
///
/// Implementors turn an in-memory PDF into plain text, pages in document
/// order. Validation of the upload (file name, empty output) lives in
/// [`extract_pdf_text`].
pub trait PdfBackend: Send + Sync {
    /// Extract the full text content of a PDF held in memory.
    fn extract_text(&self, data: &[u8]) -> Result<String, PdfError>;
}

/// Whether `filename` carries a `.pdf` suffix (ASCII case-insensitive).
pub fn has_pdf_suffix(filename: &str) -> bool {
    let len = filename.len();
    len >= 4
        && filename.is_char_boundary(len - 4)
        && filename[len - 4..].eq_ignore_ascii_case(".pdf")
}

/// Validate an upload and extract its text.
pub fn extract_pdf_text(
    backend: &dyn PdfBackend,
    file: &UploadedFile,
) -> Result<String, SummarizeError> {
    if !has_pdf_suffix(&file.filename) {
        return Err(SummarizeError::InvalidFileFormat);
    }

    let text = backend
        .extract_text(&file.data)
        .map_err(|e| SummarizeError::PdfParse(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(SummarizeError::EmptyPdfText);
    }

    tracing::debug!(
        filename = %file.filename,
        bytes = file.data.len(),
        chars = text.chars().count(),
        "extracted PDF text"
    );
    Ok(text)
}
