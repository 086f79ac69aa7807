use mupdf::{Document, TextPageFlags};

use briefly_core::{PdfBackend, PdfError};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate isolates the mupdf dependency (AGPL-3.0) so that the core
/// library and its tests do not transitively depend on it.
///
/// Text is read line by line from each page's text blocks. Lines end with a
/// newline and pages are joined with a blank line, in document order.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, data: &[u8]) -> Result<String, PdfError> {
        let document =
            Document::from_bytes(data, "pdf").map_err(|e| PdfError::Open(e.to_string()))?;

        let mut pages_text = Vec::new();

        for page_result in document
            .pages()
            .map_err(|e| PdfError::Extraction(e.to_string()))?
        {
            let page = page_result.map_err(|e| PdfError::Extraction(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| PdfError::Extraction(e.to_string()))?;

            let mut page_text = String::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(&line_text);
                    page_text.push('\n');
                }
            }
            pages_text.push(page_text);
        }

        Ok(pages_text.join("\n"))
    }
}
