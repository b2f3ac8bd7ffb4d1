pub mod types;
pub mod pdf;
pub mod ocr;
pub mod orchestrator;

pub use types::*;
pub use pdf::*;
pub use ocr::*;
pub use orchestrator::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("PDF file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF is encrypted and cannot be read. Please provide an unencrypted PDF. ({0})")]
    Encrypted(String),

    #[error("PDF file is empty (no pages found)")]
    Empty,

    #[error("Invalid or corrupted PDF file: {0}")]
    Corrupt(String),

    #[error(
        "No text could be extracted from PDF ({pages} pages). \
         Standard extraction failed (likely scanned images). \
         OCR fallback also failed: {source}. \
         Please ensure Tesseract OCR is installed or use a PDF with selectable text."
    )]
    NoText {
        pages: usize,
        #[source]
        source: OcrError,
    },
}

impl ExtractionError {
    /// Stable token for the failure kind, independent of the message text.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::Io(_) => "io",
            ExtractionError::Encrypted(_) => "encrypted",
            ExtractionError::Empty => "empty",
            ExtractionError::Corrupt(_) => "corrupt",
            ExtractionError::NoText { .. } => "no_text",
        }
    }

    /// True when the uploader can fix the problem by sending a different file.
    pub fn is_input_problem(&self) -> bool {
        !matches!(self, ExtractionError::Io(_))
    }
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error(
        "Tesseract OCR is not installed or not reachable at '{}'. \
         Install tesseract-ocr or set TESSERACT_PATH to its executable",
        binary.display()
    )]
    RecognizerMissing { binary: PathBuf },

    #[error(
        "Poppler (pdftoppm) is not installed or not reachable at '{}'. \
         Install poppler-utils or set PDFTOPPM_PATH to its executable",
        binary.display()
    )]
    RasterizerMissing { binary: PathBuf },

    #[error("OCR could not extract any text from the PDF images")]
    NoText,

    #[error("OCR extraction failed: {tool} {detail}")]
    ToolFailed { tool: &'static str, detail: String },

    #[error("OCR scratch space error: {0}")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    pub fn kind(&self) -> &'static str {
        match self {
            OcrError::RecognizerMissing { .. } => "toolchain_missing_recognizer",
            OcrError::RasterizerMissing { .. } => "toolchain_missing_rasterizer",
            OcrError::NoText => "no_text",
            OcrError::ToolFailed { .. } => "tool_failed",
            OcrError::Io(_) => "io",
        }
    }

    /// Whether the failure is a missing external binary (installation guidance applies).
    pub fn is_toolchain_missing(&self) -> bool {
        matches!(
            self,
            OcrError::RecognizerMissing { .. } | OcrError::RasterizerMissing { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_kinds_are_stable() {
        assert_eq!(ExtractionError::Empty.kind(), "empty");
        assert_eq!(ExtractionError::Encrypted("bad key".into()).kind(), "encrypted");
        assert_eq!(ExtractionError::Corrupt("xref".into()).kind(), "corrupt");
        let no_text = ExtractionError::NoText {
            pages: 3,
            source: OcrError::NoText,
        };
        assert_eq!(no_text.kind(), "no_text");
    }

    #[test]
    fn no_text_message_carries_ocr_reason() {
        let err = ExtractionError::NoText {
            pages: 2,
            source: OcrError::RecognizerMissing {
                binary: PathBuf::from("/opt/tess/tesseract"),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("2 pages"));
        assert!(msg.contains("/opt/tess/tesseract"));
        assert!(msg.contains("TESSERACT_PATH"));
        assert!(!msg.contains(".."), "doubled period: {msg}");
    }

    #[test]
    fn no_text_message_ends_with_guidance_when_tools_are_present() {
        let err = ExtractionError::NoText {
            pages: 4,
            source: OcrError::ToolFailed {
                tool: "tesseract",
                detail: "exit status 1".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("exit status 1"));
        assert!(msg.ends_with(
            "Please ensure Tesseract OCR is installed or use a PDF with selectable text."
        ));
    }

    #[test]
    fn missing_tools_are_distinguished() {
        let recognizer = OcrError::RecognizerMissing {
            binary: PathBuf::from("tesseract"),
        };
        let rasterizer = OcrError::RasterizerMissing {
            binary: PathBuf::from("pdftoppm"),
        };
        assert_ne!(recognizer.kind(), rasterizer.kind());
        assert!(recognizer.is_toolchain_missing());
        assert!(rasterizer.is_toolchain_missing());
        assert!(!OcrError::NoText.is_toolchain_missing());
        assert!(rasterizer.to_string().contains("PDFTOPPM_PATH"));
    }

    #[test]
    fn io_is_not_an_input_problem() {
        let io = ExtractionError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        assert!(!io.is_input_problem());
        assert!(ExtractionError::Empty.is_input_problem());
    }
}
