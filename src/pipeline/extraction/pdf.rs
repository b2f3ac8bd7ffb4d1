//! PDF text-layer access built on lopdf and pdf-extract.
//!
//! `LopdfLoader` parses the document structure; `LopdfDocument` serves the two
//! text views the extraction chain needs: pdf-extract's per-page output for the
//! standard pass and lopdf's content-stream reader for the retry.

use std::any::Any;
use std::cell::OnceCell;
use std::panic::{catch_unwind, AssertUnwindSafe};

use lopdf::Document;

use super::types::{PageStrategy, PdfDocument, PdfLoader, StrategyOutcome};
use super::ExtractionError;

/// What lopdf's reader emits in place of text set in an Identity-H font.
const UNDECODED_FONT_PLACEHOLDER: &str = "?Identity-H Unimplemented?";

/// Parses PDFs with lopdf.
pub struct LopdfLoader;

impl PdfLoader for LopdfLoader {
    fn load(&self, bytes: Vec<u8>) -> Result<Box<dyn PdfDocument>, ExtractionError> {
        let doc = Document::load_mem(&bytes).map_err(|e| map_load_error(&e.to_string()))?;
        Ok(Box::new(LopdfDocument {
            doc,
            bytes,
            text_pages: OnceCell::new(),
        }))
    }
}

/// Map PDF load errors, detecting encrypted PDFs.
fn map_load_error(msg: &str) -> ExtractionError {
    let lower = msg.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") || lower.contains("decrypt") {
        ExtractionError::Encrypted(msg.to_string())
    } else {
        ExtractionError::Corrupt(msg.to_string())
    }
}

pub struct LopdfDocument {
    doc: Document,
    bytes: Vec<u8>,
    /// pdf-extract text for every page, computed on first use.
    text_pages: OnceCell<Result<Vec<String>, String>>,
}

impl LopdfDocument {
    fn text_pages(&self) -> &Result<Vec<String>, String> {
        self.text_pages.get_or_init(|| {
            // pdf-extract panics on some malformed font programs. The default
            // panic hook still prints to stderr before the unwind is caught.
            match catch_unwind(AssertUnwindSafe(|| {
                pdf_extract::extract_text_from_mem_by_pages(&self.bytes)
            })) {
                Ok(Ok(pages)) => Ok(pages),
                Ok(Err(e)) => Err(e.to_string()),
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    tracing::warn!(reason = %reason, "pdf-extract panicked");
                    Err(format!("text extraction panicked: {reason}"))
                }
            }
        })
    }
}

/// The message a panic was raised with, when it carried one.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl PdfDocument for LopdfDocument {
    fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    fn decrypt(&mut self, password: &str) -> Result<(), String> {
        self.doc.decrypt(password).map_err(|e| e.to_string())
    }

    fn page_numbers(&self) -> Vec<u32> {
        self.doc.get_pages().keys().copied().collect()
    }

    fn page_text(&self, page: u32) -> Result<String, ExtractionError> {
        let pages = self
            .text_pages()
            .as_ref()
            .map_err(|e| ExtractionError::Corrupt(e.clone()))?;
        let index = page.checked_sub(1).ok_or_else(|| {
            ExtractionError::Corrupt("page numbers start at 1".to_string())
        })? as usize;
        pages.get(index).cloned().ok_or_else(|| {
            ExtractionError::Corrupt(format!(
                "page {page} missing from text output ({} pages)",
                pages.len()
            ))
        })
    }

    fn content_stream_text(&self, page: u32) -> Result<String, ExtractionError> {
        let text = self
            .doc
            .extract_text(&[page])
            .map_err(|e| ExtractionError::Corrupt(format!("page {page}: {e}")))?;
        Ok(text.replace(UNDECODED_FONT_PLACEHOLDER, ""))
    }
}

/// Standard text-layer extraction. Errors are definite and abort the document.
pub struct TextLayerStrategy;

impl PageStrategy for TextLayerStrategy {
    fn name(&self) -> &'static str {
        "text_layer"
    }

    fn extract(&self, doc: &dyn PdfDocument, page: u32) -> Result<StrategyOutcome, ExtractionError> {
        doc.page_text(page).map(StrategyOutcome::from_text)
    }
}

/// Retry for pages the standard pass left empty, reading the content stream directly.
///
/// Best effort: any failure is reported as `NoResult`, an empty page is acceptable.
pub struct ContentStreamRetryStrategy;

impl PageStrategy for ContentStreamRetryStrategy {
    fn name(&self) -> &'static str {
        "content_stream"
    }

    fn extract(&self, doc: &dyn PdfDocument, page: u32) -> Result<StrategyOutcome, ExtractionError> {
        match doc.content_stream_text(page) {
            Ok(text) => Ok(StrategyOutcome::from_text(text)),
            Err(e) => {
                tracing::debug!(page, error = %e, "Content stream retry failed, treating page as empty");
                Ok(StrategyOutcome::NoResult)
            }
        }
    }
}

/// The direct-extraction chain in priority order.
pub fn default_page_strategies() -> Vec<Box<dyn PageStrategy>> {
    vec![Box::new(TextLayerStrategy), Box::new(ContentStreamRetryStrategy)]
}
