use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ExtractionError, OcrError};

/// Transcript text produced by a successful extraction.
///
/// Never empty or whitespace-only: the extractor fails instead of returning one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptText {
    pub text: String,
    pub method: ExtractionMethod,
    pub page_count: usize,
}

impl TranscriptText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// How the transcript text was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    TextLayer,
    Ocr,
}

/// Per-page extraction result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
    /// Name of the strategy that produced the text, `None` when every strategy came up empty.
    pub strategy: Option<&'static str>,
}

impl PageText {
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Result of a single extraction strategy on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Text(String),
    /// The strategy ran but found nothing usable; the next strategy gets a turn.
    NoResult,
}

impl StrategyOutcome {
    /// Whitespace-only text counts as no result.
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            StrategyOutcome::NoResult
        } else {
            StrategyOutcome::Text(text)
        }
    }
}

/// A parsed PDF, seen page by page.
pub trait PdfDocument {
    fn is_encrypted(&self) -> bool;

    /// Attempt decryption with the given password; `Err` carries the reason.
    fn decrypt(&mut self, password: &str) -> Result<(), String>;

    /// 1-based page numbers in document order.
    fn page_numbers(&self) -> Vec<u32>;

    /// Standard text-layer extraction for one page, decoding through each font's ToUnicode map.
    fn page_text(&self, page: u32) -> Result<String, ExtractionError>;

    /// Text read straight off the page's content stream operators.
    fn content_stream_text(&self, page: u32) -> Result<String, ExtractionError>;
}

/// Parses raw bytes into a `PdfDocument` (allows mocking for tests)
pub trait PdfLoader: Send + Sync {
    fn load(&self, bytes: Vec<u8>) -> Result<Box<dyn PdfDocument>, ExtractionError>;
}

/// One link in the per-page extraction chain.
pub trait PageStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Err` is a definite failure that aborts the whole extraction.
    fn extract(&self, doc: &dyn PdfDocument, page: u32) -> Result<StrategyOutcome, ExtractionError>;
}

/// Renders every page of a PDF to an image file.
pub trait PageRasterizer: Send + Sync {
    /// Returns the rendered image paths in page order.
    fn rasterize(&self, pdf_path: &Path, dpi: u32, out_dir: &Path)
        -> Result<Vec<PathBuf>, OcrError>;
}

/// Optical character recognition on one page image.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image_path: &Path, language: &str) -> Result<String, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_text_is_no_result() {
        assert_eq!(
            StrategyOutcome::from_text("  \n\t ".into()),
            StrategyOutcome::NoResult
        );
        assert_eq!(
            StrategyOutcome::from_text("Revenue grew".into()),
            StrategyOutcome::Text("Revenue grew".into())
        );
    }

    #[test]
    fn char_count_counts_chars_not_bytes() {
        let transcript = TranscriptText {
            text: "€€€".into(),
            method: ExtractionMethod::TextLayer,
            page_count: 1,
        };
        assert_eq!(transcript.char_count(), 3);
        assert_eq!(transcript.as_str().len(), 9);
    }

    #[test]
    fn extraction_method_serializes() {
        let json = serde_json::to_string(&ExtractionMethod::TextLayer).unwrap();
        assert_eq!(json, "\"text_layer\"");
        let json = serde_json::to_string(&ExtractionMethod::Ocr).unwrap();
        assert_eq!(json, "\"ocr\"");
    }
}
