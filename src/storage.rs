//! Validated upload storage on local disk.
//!
//! Files are stored under a content-sharded path that is unique per upload:
//! `{uploads_dir}/{hash[0..2]}/{sanitized_basename}-{hash[0..8]}-{upload_id}.{extension}`

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::extract::DocumentFormat;

/// Default upload size limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Declared type sent by clients that do not know better; never rejected.
const GENERIC_MIME: &str = "application/octet-stream";

/// Reasons an upload is rejected or could not be written.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid file type. Please upload PDF or Word documents only.")]
    UnsupportedType,

    #[error("File size too large. Maximum size is {}.", format_size(.0))]
    TooLarge(u64),

    #[error("Uploaded file is empty.")]
    Empty,

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Whether the client sent something unacceptable (as opposed to a local failure).
    pub fn is_validation(&self) -> bool {
        !matches!(self, UploadError::Io(_))
    }
}

/// An upload written to disk.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub format: DocumentFormat,
    pub mime_type: String,
    pub size: u64,
    pub content_hash: String,
}

/// Writes validated uploads under a root directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    uploads_dir: PathBuf,
    max_bytes: u64,
}

impl UploadStore {
    pub fn new(uploads_dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            max_bytes,
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Check name, declared type, and size without touching the disk.
    ///
    /// The extension decides the format. A declared type, when given and not
    /// the generic octet-stream, must agree that the file is PDF or DOCX.
    pub fn validate(
        &self,
        filename: &str,
        declared_mime: Option<&str>,
        size: u64,
    ) -> Result<DocumentFormat, UploadError> {
        let format = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentFormat::from_extension)
            .ok_or(UploadError::UnsupportedType)?;

        if let Some(mime) = declared_mime.map(str::trim).filter(|m| !m.is_empty()) {
            if !mime.eq_ignore_ascii_case(GENERIC_MIME) && DocumentFormat::from_mime(mime).is_none()
            {
                return Err(UploadError::UnsupportedType);
            }
        }

        if size == 0 {
            return Err(UploadError::Empty);
        }
        if size > self.max_bytes {
            return Err(UploadError::TooLarge(self.max_bytes));
        }

        Ok(format)
    }

    /// Validate and write an upload under a path owned by `upload_id`.
    ///
    /// Identical content uploaded twice gets two files, so removing one
    /// upload never touches another.
    pub async fn store(
        &self,
        upload_id: &str,
        filename: &str,
        declared_mime: Option<&str>,
        content: &[u8],
    ) -> Result<StoredUpload, UploadError> {
        let format = self.validate(filename, declared_mime, content.len() as u64)?;

        let content_hash = compute_hash(content);
        let basename = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let path = content_storage_path(
            &self.uploads_dir,
            &content_hash,
            upload_id,
            basename,
            format.extension(),
        );

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;

        Ok(StoredUpload {
            path,
            format,
            mime_type: format.mime_type().to_string(),
            size: content.len() as u64,
            content_hash,
        })
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, path: &Path) -> std::io::Result<()> {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Hex SHA-256 of the content.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Construct the storage path for an upload.
pub fn content_storage_path(
    uploads_dir: &Path,
    content_hash: &str,
    upload_id: &str,
    basename: &str,
    extension: &str,
) -> PathBuf {
    let filename = format!(
        "{}-{}-{}.{}",
        sanitize_filename(basename),
        &content_hash[..8],
        sanitize_filename(upload_id),
        extension
    );
    uploads_dir.join(&content_hash[..2]).join(filename)
}

/// Sanitize a filename for safe filesystem storage.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('_');
    if trimmed.is_empty() {
        return "document".to_string();
    }

    let mut end = trimmed.len().min(100);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

fn format_size(bytes: &u64) -> String {
    const MIB: u64 = 1024 * 1024;
    let bytes = *bytes;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{DOCX_MIME, PDF_MIME};

    fn store(dir: &Path) -> UploadStore {
        UploadStore::new(dir, DEFAULT_MAX_UPLOAD_BYTES)
    }

    #[test]
    fn test_validate_accepts_supported_types() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert_eq!(
            store.validate("lease.pdf", Some(PDF_MIME), 10).unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            store.validate("NDA.DOCX", Some(DOCX_MIME), 10).unwrap(),
            DocumentFormat::Docx
        );
        assert_eq!(
            store
                .validate("lease.pdf", Some("application/octet-stream"), 10)
                .unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(store.validate("lease.pdf", None, 10).unwrap(), DocumentFormat::Pdf);
    }

    #[test]
    fn test_validate_rejects_unsupported_types() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert!(matches!(
            store.validate("notes.txt", Some("text/plain"), 10),
            Err(UploadError::UnsupportedType)
        ));
        assert!(matches!(
            store.validate("legacy.doc", Some("application/msword"), 10),
            Err(UploadError::UnsupportedType)
        ));
        assert!(matches!(
            store.validate("lease.pdf", Some("image/png"), 10),
            Err(UploadError::UnsupportedType)
        ));
        assert!(matches!(
            store.validate("no_extension", Some(PDF_MIME), 10),
            Err(UploadError::UnsupportedType)
        ));
    }

    #[test]
    fn test_validate_size_limits() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert!(store
            .validate("a.pdf", None, DEFAULT_MAX_UPLOAD_BYTES)
            .is_ok());
        let err = store
            .validate("a.pdf", None, DEFAULT_MAX_UPLOAD_BYTES + 1)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "File size too large. Maximum size is 10MB."
        );
        assert!(matches!(
            store.validate("a.pdf", None, 0),
            Err(UploadError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_store_writes_content_sharded_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let content = b"%PDF-1.4 test";

        let stored = store
            .store("upload-1", "Master Lease: 2024.pdf", Some(PDF_MIME), content)
            .await
            .unwrap();

        let hash = compute_hash(content);
        assert_eq!(stored.content_hash, hash);
        assert_eq!(stored.size, content.len() as u64);
        assert_eq!(stored.mime_type, PDF_MIME);
        assert_eq!(
            stored.path,
            dir.path()
                .join(&hash[..2])
                .join(format!("Master Lease_ 2024-{}-upload-1.pdf", &hash[..8]))
        );
        assert_eq!(std::fs::read(&stored.path).unwrap(), content);
    }

    #[tokio::test]
    async fn test_identical_uploads_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let content = b"%PDF-1.4 same bytes";

        let first = store.store("a", "lease.pdf", None, content).await.unwrap();
        let second = store.store("b", "lease.pdf", None, content).await.unwrap();
        assert_ne!(first.path, second.path);

        store.remove(&first.path).await.unwrap();
        assert!(!first.path.exists());
        assert_eq!(std::fs::read(&second.path).unwrap(), content);
    }

    #[tokio::test]
    async fn test_store_rejects_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let err = store.store("upload-1", "evil.exe", None, b"MZ").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_remove_ignores_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.remove(&dir.path().join("gone.pdf")).await.unwrap();
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_filename("  "), "document");
        assert_eq!(sanitize_filename("__"), "document");
        assert_eq!(sanitize_filename(&"é".repeat(80)).len(), 100);
    }
}
