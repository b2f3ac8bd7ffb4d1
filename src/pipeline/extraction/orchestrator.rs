use std::io::Write;
use std::path::Path;

use super::ocr::{OcrFallback, OcrSettings};
use super::pdf::{default_page_strategies, LopdfLoader};
use super::types::{
    ExtractionMethod, PageStrategy, PageText, PdfDocument, PdfLoader, StrategyOutcome,
    TranscriptText,
};
use super::ExtractionError;

/// Transcript text extractor.
/// Uses trait objects for PDF parsing, page strategies and OCR, enabling dependency injection.
///
/// Direct extraction runs the page strategies in order, first text wins per page.
/// Only when every page comes up empty is the whole document handed to OCR.
pub struct TranscriptExtractor {
    loader: Box<dyn PdfLoader>,
    strategies: Vec<Box<dyn PageStrategy>>,
    ocr: OcrFallback,
}

impl TranscriptExtractor {
    pub fn new(
        loader: Box<dyn PdfLoader>,
        strategies: Vec<Box<dyn PageStrategy>>,
        ocr: OcrFallback,
    ) -> Self {
        Self {
            loader,
            strategies,
            ocr,
        }
    }

    /// pdf-extract text layer, content-stream retry, then the CLI OCR toolchain from `settings`.
    pub fn from_settings(settings: &OcrSettings) -> Self {
        Self::new(
            Box::new(LopdfLoader),
            default_page_strategies(),
            OcrFallback::from_settings(settings),
        )
    }

    /// Extract transcript text from the PDF at `pdf_path`. The file is only read.
    pub fn extract_text(&self, pdf_path: &Path) -> Result<TranscriptText, ExtractionError> {
        let bytes = std::fs::read(pdf_path)?;
        let byte_len = bytes.len();
        let mut doc = self.loader.load(bytes)?;

        if doc.is_encrypted() {
            doc.decrypt("").map_err(ExtractionError::Encrypted)?;
            tracing::debug!("Decrypted PDF with empty password");
        }

        let page_numbers = doc.page_numbers();
        if page_numbers.is_empty() {
            return Err(ExtractionError::Empty);
        }
        let page_count = page_numbers.len();

        tracing::info!(pages = page_count, bytes = byte_len, "Starting text extraction");

        let pages = self.extract_pages(doc.as_ref(), &page_numbers)?;
        let text = join_page_texts(&pages);

        if text.trim().is_empty() {
            tracing::warn!(
                pages = page_count,
                "No text layer found in PDF, attempting OCR"
            );
            return self
                .ocr
                .extract_via_ocr(pdf_path)
                .map_err(|source| ExtractionError::NoText {
                    pages: page_count,
                    source,
                });
        }

        tracing::info!(
            pages = page_count,
            pages_with_text = pages.iter().filter(|p| p.has_text()).count(),
            text_len = text.len(),
            "Text extraction complete"
        );

        Ok(TranscriptText {
            text,
            method: ExtractionMethod::TextLayer,
            page_count,
        })
    }

    /// Same as `extract_text`, for a document held in memory.
    pub fn extract_text_from_bytes(&self, bytes: &[u8]) -> Result<TranscriptText, ExtractionError> {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        self.extract_text(file.path())
    }

    /// Run the strategy chain over each page in order.
    pub fn extract_pages(
        &self,
        doc: &dyn PdfDocument,
        page_numbers: &[u32],
    ) -> Result<Vec<PageText>, ExtractionError> {
        let mut pages = Vec::with_capacity(page_numbers.len());

        for &page_number in page_numbers {
            let mut page = PageText {
                page_number,
                text: String::new(),
                strategy: None,
            };

            for strategy in &self.strategies {
                match strategy.extract(doc, page_number)? {
                    StrategyOutcome::Text(text) => {
                        page.text = text;
                        page.strategy = Some(strategy.name());
                        break;
                    }
                    StrategyOutcome::NoResult => continue,
                }
            }

            tracing::debug!(
                page = page_number,
                strategy = page.strategy.unwrap_or("none"),
                text_len = page.text.len(),
                "Page extracted"
            );
            pages.push(page);
        }

        Ok(pages)
    }
}

/// Newline-join the pages that produced text, skipping empty ones.
pub fn join_page_texts(pages: &[PageText]) -> String {
    pages
        .iter()
        .filter(|p| p.has_text())
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
