//! OCR fallback for image-only PDFs.
//!
//! Pages are rendered with poppler's `pdftoppm` and read back with the
//! `tesseract` CLI. Both executables are located through injected paths so the
//! host decides where they live.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::types::{ExtractionMethod, PageRasterizer, TextRecognizer, TranscriptText};
use super::OcrError;

/// Rendering resolution for OCR.
/// 300 DPI balances recognition accuracy against processing time and memory.
pub const DEFAULT_OCR_DPI: u32 = 300;

/// Recognition language passed to the recognizer.
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

/// Settings for the OCR toolchain.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrSettings {
    pub rasterizer_path: PathBuf,
    pub recognizer_path: PathBuf,
    pub dpi: u32,
    pub language: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            rasterizer_path: PathBuf::from("pdftoppm"),
            recognizer_path: PathBuf::from("tesseract"),
            dpi: DEFAULT_OCR_DPI,
            language: DEFAULT_OCR_LANGUAGE.to_string(),
        }
    }
}

/// Rasterize-then-recognize driver.
pub struct OcrFallback {
    rasterizer: Box<dyn PageRasterizer>,
    recognizer: Box<dyn TextRecognizer>,
    dpi: u32,
    language: String,
}

impl OcrFallback {
    pub fn new(
        rasterizer: Box<dyn PageRasterizer>,
        recognizer: Box<dyn TextRecognizer>,
    ) -> Self {
        Self {
            rasterizer,
            recognizer,
            dpi: DEFAULT_OCR_DPI,
            language: DEFAULT_OCR_LANGUAGE.to_string(),
        }
    }

    /// Build the CLI-backed toolchain from settings.
    pub fn from_settings(settings: &OcrSettings) -> Self {
        Self {
            rasterizer: Box::new(PdftoppmRasterizer::new(&settings.rasterizer_path)),
            recognizer: Box::new(TesseractRecognizer::new(&settings.recognizer_path)),
            dpi: settings.dpi,
            language: settings.language.clone(),
        }
    }

    /// OCR every page of the PDF at `pdf_path`, one page at a time.
    ///
    /// Non-empty page results are joined with newlines in page order.
    pub fn extract_via_ocr(&self, pdf_path: &Path) -> Result<TranscriptText, OcrError> {
        let scratch = tempfile::tempdir()?;
        let images = self.rasterizer.rasterize(pdf_path, self.dpi, scratch.path())?;

        tracing::info!(
            pages = images.len(),
            dpi = self.dpi,
            language = %self.language,
            "Rendered pages for OCR"
        );

        let start = std::time::Instant::now();
        let mut parts = Vec::with_capacity(images.len());
        for (idx, image) in images.iter().enumerate() {
            let text = self.recognizer.recognize(image, &self.language)?;
            if text.trim().is_empty() {
                tracing::debug!(page = idx + 1, "OCR found no text on page");
                continue;
            }
            parts.push(text);
        }

        let text = parts.join("\n");
        if text.trim().is_empty() {
            return Err(OcrError::NoText);
        }

        tracing::info!(
            pages = images.len(),
            pages_with_text = parts.len(),
            text_len = text.len(),
            elapsed_ms = %start.elapsed().as_millis(),
            "OCR complete"
        );

        if let Err(e) = scratch.close() {
            tracing::debug!(error = %e, "Failed to remove OCR scratch directory");
        }

        Ok(TranscriptText {
            text,
            method: ExtractionMethod::Ocr,
            page_count: images.len(),
        })
    }
}

/// Renders pages to PNG with poppler's `pdftoppm`.
pub struct PdftoppmRasterizer {
    binary: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(binary: &Path) -> Self {
        Self {
            binary: binary.to_path_buf(),
        }
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(
        &self,
        pdf_path: &Path,
        dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, OcrError> {
        let output = Command::new(&self.binary)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg(pdf_path)
            .arg(out_dir.join("page"))
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => OcrError::RasterizerMissing {
                    binary: self.binary.clone(),
                },
                _ => OcrError::ToolFailed {
                    tool: "pdftoppm",
                    detail: e.to_string(),
                },
            })?;

        if !output.status.success() {
            return Err(OcrError::ToolFailed {
                tool: "pdftoppm",
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let images = rendered_pages(out_dir)?;
        if images.is_empty() {
            return Err(OcrError::ToolFailed {
                tool: "pdftoppm",
                detail: "produced no images".to_string(),
            });
        }
        Ok(images)
    }
}

/// The PNG pages pdftoppm wrote into `out_dir`, in page order.
fn rendered_pages(out_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(out_dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "png") {
            if let Some(n) = rendered_page_number(&path) {
                images.push((n, path));
            }
        }
    }
    images.sort_by_key(|(n, _)| *n);
    Ok(images.into_iter().map(|(_, path)| path).collect())
}

/// Page number from a pdftoppm output name such as `page-07.png`.
/// pdftoppm zero-pads to the width of the page count, so names alone don't sort numerically.
fn rendered_page_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let (_, digits) = stem.rsplit_once('-')?;
    digits.parse().ok()
}

/// Recognizes text with the `tesseract` CLI, printing results to stdout.
pub struct TesseractRecognizer {
    binary: PathBuf,
}

impl TesseractRecognizer {
    pub fn new(binary: &Path) -> Self {
        Self {
            binary: binary.to_path_buf(),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image_path: &Path, language: &str) -> Result<String, OcrError> {
        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => OcrError::RecognizerMissing {
                    binary: self.binary.clone(),
                },
                _ => OcrError::ToolFailed {
                    tool: "tesseract",
                    detail: e.to_string(),
                },
            })?;

        if !output.status.success() {
            return Err(OcrError::ToolFailed {
                tool: "tesseract",
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Mock rasterizer for unit testing without poppler.
/// Writes one placeholder file per configured page.
pub struct MockRasterizer {
    pages: usize,
    missing: bool,
}

impl MockRasterizer {
    pub fn new(pages: usize) -> Self {
        Self {
            pages,
            missing: false,
        }
    }

    /// Behave as if the rasterizer executable is not installed.
    pub fn missing() -> Self {
        Self {
            pages: 0,
            missing: true,
        }
    }
}

impl PageRasterizer for MockRasterizer {
    fn rasterize(
        &self,
        _pdf_path: &Path,
        _dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, OcrError> {
        if self.missing {
            return Err(OcrError::RasterizerMissing {
                binary: PathBuf::from("pdftoppm"),
            });
        }
        (1..=self.pages)
            .map(|n| {
                let path = out_dir.join(format!("page-{n}.png"));
                std::fs::write(&path, n.to_string())?;
                Ok(path)
            })
            .collect()
    }
}

/// Mock recognizer for unit testing without Tesseract.
/// Returns the configured text for each page in turn, empty once exhausted.
pub struct MockRecognizer {
    page_texts: Vec<String>,
    missing: bool,
}

impl MockRecognizer {
    pub fn new(page_texts: &[&str]) -> Self {
        Self {
            page_texts: page_texts.iter().map(|t| t.to_string()).collect(),
            missing: false,
        }
    }

    /// Behave as if the recognizer executable is not installed.
    pub fn missing() -> Self {
        Self {
            page_texts: vec![],
            missing: true,
        }
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(&self, image_path: &Path, _language: &str) -> Result<String, OcrError> {
        if self.missing {
            return Err(OcrError::RecognizerMissing {
                binary: PathBuf::from("tesseract"),
            });
        }
        let page = rendered_page_number(image_path).unwrap_or(1) as usize;
        Ok(self
            .page_texts
            .get(page.saturating_sub(1))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback(rasterizer: MockRasterizer, recognizer: MockRecognizer) -> OcrFallback {
        OcrFallback::new(Box::new(rasterizer), Box::new(recognizer))
    }

    #[test]
    fn joins_non_empty_pages_in_order() {
        let ocr = fallback(
            MockRasterizer::new(3),
            MockRecognizer::new(&["Prepared remarks", "   ", "Closing"]),
        );
        let result = ocr.extract_via_ocr(Path::new("scan.pdf")).unwrap();
        assert_eq!(result.text, "Prepared remarks\nClosing");
        assert_eq!(result.method, ExtractionMethod::Ocr);
        assert_eq!(result.page_count, 3);
    }

    #[test]
    fn all_empty_pages_is_no_text() {
        let ocr = fallback(MockRasterizer::new(2), MockRecognizer::new(&["", "\n"]));
        let result = ocr.extract_via_ocr(Path::new("scan.pdf"));
        assert!(matches!(result, Err(OcrError::NoText)));
    }

    #[test]
    fn missing_rasterizer_is_reported() {
        let ocr = fallback(MockRasterizer::missing(), MockRecognizer::new(&["x"]));
        let err = ocr.extract_via_ocr(Path::new("scan.pdf")).unwrap_err();
        assert_eq!(err.kind(), "toolchain_missing_rasterizer");
    }

    #[test]
    fn missing_recognizer_is_reported() {
        let ocr = fallback(MockRasterizer::new(1), MockRecognizer::missing());
        let err = ocr.extract_via_ocr(Path::new("scan.pdf")).unwrap_err();
        assert_eq!(err.kind(), "toolchain_missing_recognizer");
    }

    #[test]
    fn pages_sort_numerically() {
        assert_eq!(rendered_page_number(Path::new("/tmp/x/page-07.png")), Some(7));
        assert_eq!(rendered_page_number(Path::new("/tmp/x/page-112.png")), Some(112));
        assert_eq!(rendered_page_number(Path::new("/tmp/x/cover.png")), None);
    }

    #[test]
    fn rendered_pages_lists_png_pages_in_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-02.png", "page-01.png", "notes.txt", "cover.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let names: Vec<String> = rendered_pages(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-01.png", "page-02.png", "page-10.png"]);
    }

    #[test]
    fn unreadable_render_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = rendered_pages(&dir.path().join("gone"));
        assert!(matches!(result, Err(OcrError::Io(_))));
    }

    #[test]
    fn absent_rasterizer_binary_maps_to_rasterizer_missing() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = PdftoppmRasterizer::new(Path::new("/nonexistent/bin/pdftoppm"));
        let result = rasterizer.rasterize(Path::new("in.pdf"), 300, dir.path());
        assert!(matches!(result, Err(OcrError::RasterizerMissing { .. })));
    }

    #[test]
    fn absent_recognizer_binary_maps_to_recognizer_missing() {
        let recognizer = TesseractRecognizer::new(Path::new("/nonexistent/bin/tesseract"));
        let result = recognizer.recognize(Path::new("page-1.png"), "eng");
        assert!(matches!(result, Err(OcrError::RecognizerMissing { .. })));
    }

    #[test]
    fn settings_default_to_path_lookup() {
        let settings = OcrSettings::default();
        assert_eq!(settings.rasterizer_path, PathBuf::from("pdftoppm"));
        assert_eq!(settings.recognizer_path, PathBuf::from("tesseract"));
        assert_eq!(settings.dpi, 300);
        assert_eq!(settings.language, "eng");
    }
}
