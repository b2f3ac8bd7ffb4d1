//! Document processing orchestrator.
//!
//! Single entry point that drives one uploaded transcript through the
//! pipeline: extract text → analyze with the LLM.
//!
//! Uses trait-based DI for every engine (PDF loader, OCR toolchain,
//! LlmClient) so the orchestrator stays testable with mock implementations.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::pipeline::analysis::{AnalysisError, AnalysisResult, TranscriptAnalyzer};
use crate::pipeline::extraction::{ExtractionError, ExtractionMethod, TranscriptExtractor};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while processing one document.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("{0}")]
    Analysis(#[from] AnalysisError),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Extraction(e) => e.kind(),
            PipelineError::Analysis(e) => e.kind(),
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Extraction stage summary. Carries no transcript content.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub method: ExtractionMethod,
    pub page_count: usize,
    pub text_length: usize,
}

/// Output of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingOutcome {
    pub extraction: ExtractionSummary,
    pub analysis: AnalysisResult,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Orchestrates document processing: extract → analyze.
///
/// Pure pipeline logic. Does NOT know about HTTP; status codes belong to the
/// API layer. Stateless between calls, so one instance serves concurrent
/// requests.
pub struct DocumentProcessor {
    extractor: TranscriptExtractor,
    analyzer: TranscriptAnalyzer,
}

impl DocumentProcessor {
    pub fn new(extractor: TranscriptExtractor, analyzer: TranscriptAnalyzer) -> Self {
        Self {
            extractor,
            analyzer,
        }
    }

    pub fn llm_configured(&self) -> bool {
        self.analyzer.is_configured()
    }

    /// Full pipeline for the PDF at `pdf_path`.
    ///
    /// An extraction failure stops the run before any LLM call.
    pub fn process(&self, pdf_path: &Path) -> Result<ProcessingOutcome, PipelineError> {
        let start = Instant::now();

        let transcript = self.extractor.extract_text(pdf_path)?;
        let extraction = ExtractionSummary {
            method: transcript.method,
            page_count: transcript.page_count,
            text_length: transcript.char_count(),
        };
        tracing::debug!(
            method = ?extraction.method,
            pages = extraction.page_count,
            chars = extraction.text_length,
            "Extraction stage done"
        );

        let analysis = self.analyzer.analyze(transcript.as_str())?;

        tracing::info!(
            method = ?extraction.method,
            pages = extraction.page_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Document processed"
        );

        Ok(ProcessingOutcome {
            extraction,
            analysis,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::pipeline::analysis::MockLlmClient;
    use crate::pipeline::extraction::pdf::fixtures::make_test_pdf;
    use crate::pipeline::extraction::{
        default_page_strategies, LopdfLoader, MockRasterizer, MockRecognizer, OcrFallback,
    };

    const VALID_RESPONSE: &str = r#"{"tone":"neutral","confidence":"medium","positives":["Stable margins"],"concerns":["Not mentioned"],"guidance":"Reaffirmed","capacity_trend":"stable","growth_initiatives":["Not mentioned"]}"#;

    fn processor(ocr_pages: &[&str], llm: Arc<MockLlmClient>) -> DocumentProcessor {
        let ocr = OcrFallback::new(
            Box::new(MockRasterizer::new(ocr_pages.len())),
            Box::new(MockRecognizer::new(ocr_pages)),
        );
        DocumentProcessor::new(
            TranscriptExtractor::new(Box::new(LopdfLoader), default_page_strategies(), ocr),
            TranscriptAnalyzer::new(llm),
        )
    }

    fn write_pdf(dir: &tempfile::TempDir, pages: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join("call.pdf");
        std::fs::write(&path, make_test_pdf(pages)).unwrap();
        path
    }

    #[test]
    fn digital_pdf_flows_into_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(&dir, &["Operator: Welcome", "CFO: Margins held"]);
        let llm = Arc::new(MockLlmClient::new(VALID_RESPONSE));

        let outcome = processor(&[], llm.clone()).process(&path).unwrap();

        assert_eq!(outcome.extraction.method, ExtractionMethod::TextLayer);
        assert_eq!(outcome.extraction.page_count, 2);
        assert_eq!(outcome.analysis.guidance(), Some("Reaffirmed"));
        let user = llm.last_request().unwrap().user;
        assert!(user.contains("Operator: Welcome"));
        assert!(user.contains("CFO: Margins held"));
    }

    #[test]
    fn scanned_pdf_uses_ocr_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(&dir, &[""]);
        let llm = Arc::new(MockLlmClient::new(VALID_RESPONSE));

        let outcome = processor(&["Scanned remarks"], llm.clone())
            .process(&path)
            .unwrap();

        assert_eq!(outcome.extraction.method, ExtractionMethod::Ocr);
        assert!(llm.last_request().unwrap().user.ends_with("Scanned remarks"));
    }

    #[test]
    fn extraction_failure_skips_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();
        let llm = Arc::new(MockLlmClient::new(VALID_RESPONSE));

        let err = processor(&[], llm.clone()).process(&path).unwrap_err();

        assert!(matches!(err, PipelineError::Extraction(_)));
        assert_eq!(err.kind(), "corrupt");
        assert_eq!(llm.call_count(), 0);
    }

    #[test]
    fn no_text_anywhere_skips_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(&dir, &[""]);
        let llm = Arc::new(MockLlmClient::new(VALID_RESPONSE));

        let err = processor(&[""], llm.clone()).process(&path).unwrap_err();

        assert_eq!(err.kind(), "no_text");
        assert_eq!(llm.call_count(), 0);
    }

    #[test]
    fn analysis_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(&dir, &["CEO: Good quarter"]);
        let llm = Arc::new(MockLlmClient::new(r#"{"tone":"optimistic"}"#));

        let err = processor(&[], llm).process(&path).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Analysis(AnalysisError::MissingField("confidence"))
        ));
    }

    #[test]
    fn missing_credential_is_reported_after_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(&dir, &["CEO: Good quarter"]);
        let llm = Arc::new(MockLlmClient::unconfigured());

        let proc = processor(&[], llm.clone());
        assert!(!proc.llm_configured());
        let err = proc.process(&path).unwrap_err();

        assert_eq!(err.kind(), "missing_credential");
        assert_eq!(llm.call_count(), 0);
    }
}
