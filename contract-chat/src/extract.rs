//! Text extraction from uploaded document bytes.
//!
//! [`PlainTextExtractor`] is always available. [`PdfTextExtractor`] reads the
//! text layer of PDF files and requires the `pdf` feature.

use crate::error::Result;

/// Extracts plain text, page by page, from a document byte stream.
pub trait TextExtractor: Send + Sync {
    /// Return the text of each page, in page order.
    ///
    /// Pages without extractable text are returned as empty strings.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>>;

    /// Concatenate the non-empty pages, each followed by a newline.
    ///
    /// An empty result means the document has no text layer.
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let mut text = String::new();
        for page in self.extract_pages(bytes)? {
            if !page.is_empty() {
                text.push_str(&page);
                text.push('\n');
            }
        }
        Ok(text)
    }
}

/// Treats the input as a single page of UTF-8 text.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
        Ok(vec![String::from_utf8_lossy(bytes).into_owned()])
    }
}

/// Reads the text layer of a PDF, one string per page.
///
/// Image-only pages yield empty strings instead of errors.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

#[cfg(feature = "pdf")]
impl TextExtractor for PdfTextExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
        use crate::error::ChatError;

        let document = lopdf::Document::load_mem(bytes).map_err(|e| {
            tracing::error!(error = %e, "failed to load PDF");
            ChatError::Extraction(format!("failed to load PDF: {e}"))
        })?;

        let pages = document
            .get_pages()
            .into_keys()
            .map(|page_number| match document.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!(page_number, error = %e, "page has no extractable text");
                    String::new()
                }
            })
            .collect();

        Ok(pages)
    }
}
