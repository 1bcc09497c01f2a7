//! Uploaded documents and their analysis status.
//!
//! A document's status is the only mutable part of its row; the upload
//! metadata never changes after insertion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Analysis status of a document.
///
/// The string values are a stable wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether an analyze request may move this document to `processing`.
    pub fn can_start_analysis(&self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded legal document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier for this document.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Original filename as uploaded.
    pub filename: String,
    /// Location of the stored upload.
    pub file_path: PathBuf,
    /// Declared MIME type at upload time.
    pub mime_type: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Current analysis status.
    pub status: DocumentStatus,
    /// When the document was uploaded.
    pub created_at: DateTime<Utc>,
    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a new `pending` document for a stored upload.
    pub fn new(
        user_id: impl Into<String>,
        filename: impl Into<String>,
        file_path: PathBuf,
        mime_type: impl Into<String>,
        file_size: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            filename: filename.into(),
            file_path,
            mime_type: mime_type.into(),
            file_size,
            status: DocumentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Use a pre-assigned id, e.g. one already baked into the stored file name.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Document listing entry, joined with its analysis score when one exists.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub status: DocumentStatus,
    pub file_size: u64,
    pub confidence_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}
