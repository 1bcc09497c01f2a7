//! Service layer for DocuMind business logic.
//!
//! Services are shared by the CLI and the HTTP server; neither talks to the
//! repositories directly for lifecycle operations.

pub mod billing;
pub mod lifecycle;
pub mod plan;

use thiserror::Error;

use crate::repository::DbError;
use crate::storage::UploadError;

pub use billing::{BillingEvent, BillingOutcome, BillingService};
pub use lifecycle::DocumentService;
pub use plan::{PlanLimiter, PlanLimits, Usage};

/// Errors returned by document and plan operations.
///
/// Messages are safe to show to the caller; analysis failure details only
/// go to the log.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document not found")]
    NotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Document is already being processed")]
    AlreadyProcessing,

    #[error("Document has already been analyzed")]
    AlreadyAnalyzed,

    #[error("Document analysis not completed")]
    ResultsNotReady,

    #[error("Monthly limit reached. Upgrade to Pro for unlimited document analysis.")]
    PlanLimitReached,

    #[error("{0}")]
    InvalidUpload(String),

    #[error("Failed to analyze document")]
    AnalysisFailed,

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<UploadError> for DocumentError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Io(io) => DocumentError::Storage(io),
            other => DocumentError::InvalidUpload(other.to_string()),
        }
    }
}
