//! Text extraction from uploaded PDF and DOCX files.
//!
//! Exactly two formats are supported. Anything else is rejected before the
//! file is touched.

mod docx;
mod pdf;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use docx::extract_docx_text;
pub use pdf::{extract_pdf_text, pdftotext_path};

/// MIME type of PDF uploads.
pub const PDF_MIME: &str = "application/pdf";
/// MIME type of DOCX uploads.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Errors that can occur during text extraction.
///
/// Messages are short causes suitable for logs; they never carry the
/// underlying library's backtrace.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),
}

impl From<std::io::Error> for ExtractionError {
    fn from(e: std::io::Error) -> Self {
        ExtractionError::ExtractionFailed(e.to_string())
    }
}

/// A supported document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn from_mime(mime_type: &str) -> Option<Self> {
        // Ignore parameters such as "; charset=binary"
        let essence = mime_type.split(';').next().unwrap_or("").trim();
        match essence.to_lowercase().as_str() {
            PDF_MIME => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Docx),
            _ => None,
        }
    }

    /// Decide the format from the file extension, then the declared MIME type.
    pub fn detect(path: &Path, mime_type: Option<&str>) -> Result<Self, ExtractionError> {
        let ext = path.extension().and_then(|e| e.to_str());
        ext.and_then(Self::from_extension)
            .or_else(|| mime_type.and_then(Self::from_mime))
            .ok_or_else(|| {
                ExtractionError::UnsupportedFormat(
                    ext.map(|e| format!(".{}", e))
                        .or_else(|| mime_type.map(str::to_string))
                        .unwrap_or_else(|| "unknown".to_string()),
                )
            })
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => PDF_MIME,
            Self::Docx => DOCX_MIME,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

/// Text extractor for stored uploads.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract plain text. Empty output is a success.
    pub fn extract(&self, path: &Path, mime_type: Option<&str>) -> Result<String, ExtractionError> {
        match DocumentFormat::detect(path, mime_type)? {
            DocumentFormat::Pdf => extract_pdf_text(path),
            DocumentFormat::Docx => extract_docx_text(path),
        }
    }

    /// Extract on the blocking pool.
    pub async fn extract_async(
        &self,
        path: &Path,
        mime_type: Option<&str>,
    ) -> Result<String, ExtractionError> {
        // Reject before spawning anything
        DocumentFormat::detect(path, mime_type)?;

        let extractor = self.clone();
        let path: PathBuf = path.to_path_buf();
        let mime_type = mime_type.map(str::to_string);
        tokio::task::spawn_blocking(move || extractor.extract(&path, mime_type.as_deref()))
            .await
            .map_err(|e| ExtractionError::ExtractionFailed(format!("extraction task: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension_then_mime() {
        assert_eq!(
            DocumentFormat::detect(Path::new("a/Lease.PDF"), None).unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::detect(Path::new("a/contract.docx"), Some(PDF_MIME)).unwrap(),
            DocumentFormat::Docx
        );
        assert_eq!(
            DocumentFormat::detect(Path::new("a/upload"), Some(DOCX_MIME)).unwrap(),
            DocumentFormat::Docx
        );
    }

    #[test]
    fn test_detect_rejects_other_formats() {
        let err = DocumentFormat::detect(Path::new("notes.txt"), Some("text/plain")).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(ref f) if f == ".txt"));

        let err = DocumentFormat::detect(Path::new("legacy.doc"), None).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_unsupported_extension_fails_without_reading_file() {
        // The file does not exist; a format error proves no I/O happened.
        let err = TextExtractor::new()
            .extract(Path::new("/nonexistent/sheet.xlsx"), None)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_mime_parameters_are_ignored() {
        assert_eq!(
            DocumentFormat::from_mime("application/pdf; charset=binary"),
            Some(DocumentFormat::Pdf)
        );
    }

    #[tokio::test]
    async fn test_missing_docx_is_extraction_failure() {
        let err = TextExtractor::new()
            .extract_async(Path::new("/nonexistent/contract.docx"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailed(_)));
    }
}
