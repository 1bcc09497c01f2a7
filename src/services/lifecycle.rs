//! Document lifecycle: upload, analyze, results, delete.
//!
//! Status moves `pending -> processing -> completed | failed`. A failed
//! document may be analyzed again; a completed one may not.

use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{info, warn};

use super::{DocumentError, PlanLimiter, PlanLimits, Usage};
use crate::analysis::{confidence_score, AnalysisError, Analyzer};
use crate::extract::{ExtractionError, TextExtractor};
use crate::models::{AnalysisResult, Document, DocumentStatus, DocumentSummary, StoredAnalysis};
use crate::repository::DbContext;
use crate::storage::UploadStore;

/// Why a single analysis attempt failed. Logged, never returned to callers.
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Runs the document lifecycle against storage, the extractor, and the analyzer.
#[derive(Clone)]
pub struct DocumentService {
    ctx: DbContext,
    analyzer: Arc<dyn Analyzer>,
    extractor: TextExtractor,
    limiter: PlanLimiter,
    store: UploadStore,
}

impl DocumentService {
    pub fn new(
        ctx: DbContext,
        analyzer: Arc<dyn Analyzer>,
        store: UploadStore,
        limits: PlanLimits,
    ) -> Self {
        let limiter = PlanLimiter::new(ctx.users(), limits);
        Self {
            ctx,
            analyzer,
            extractor: TextExtractor::new(),
            limiter,
            store,
        }
    }

    pub fn limiter(&self) -> &PlanLimiter {
        &self.limiter
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    /// Store an upload and register it as a pending document.
    pub async fn upload(
        &self,
        user_id: &str,
        filename: &str,
        declared_mime: Option<&str>,
        content: &[u8],
    ) -> Result<Document, DocumentError> {
        self.limiter.check(user_id).await?;

        let document_id = uuid::Uuid::new_v4().to_string();
        let stored = self
            .store
            .store(&document_id, filename, declared_mime, content)
            .await?;
        let doc = Document::new(
            user_id,
            filename,
            stored.path.clone(),
            stored.mime_type.clone(),
            stored.size,
        )
        .with_id(document_id);

        if let Err(e) = self.ctx.documents().create(&doc).await {
            if let Err(cleanup) = self.store.remove(&stored.path).await {
                warn!(
                    "Could not remove {} after failed upload: {}",
                    stored.path.display(),
                    cleanup
                );
            }
            return Err(e.into());
        }

        info!("Uploaded {} as document {} ({} bytes)", filename, doc.id, doc.file_size);
        Ok(doc)
    }

    /// A user's documents, newest first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<DocumentSummary>, DocumentError> {
        Ok(self.ctx.documents().list_for_user(user_id).await?)
    }

    /// Look up a document owned by `user_id`.
    pub async fn get(&self, user_id: &str, document_id: &str) -> Result<Document, DocumentError> {
        self.ctx
            .documents()
            .get_for_user(document_id, user_id)
            .await?
            .ok_or(DocumentError::NotFound)
    }

    /// Analyze a pending or failed document.
    ///
    /// On success the analysis is stored, the document is `completed`, and
    /// the owner's counter goes up by one. On failure the document is
    /// `failed`, nothing is stored, and the caller gets a generic error.
    pub async fn analyze(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<StoredAnalysis, DocumentError> {
        self.limiter.check(user_id).await?;

        let doc = self.get(user_id, document_id).await?;
        match doc.status {
            DocumentStatus::Processing => return Err(DocumentError::AlreadyProcessing),
            DocumentStatus::Completed => return Err(DocumentError::AlreadyAnalyzed),
            DocumentStatus::Pending | DocumentStatus::Failed => {}
        }

        self.ctx
            .documents()
            .set_status(&doc.id, DocumentStatus::Processing)
            .await?;
        info!("Analyzing document {} ({})", doc.id, doc.filename);

        let result = match self.run_attempt(&doc).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Analysis of document {} failed: {}", doc.id, e);
                self.mark_failed(&doc.id).await;
                return Err(DocumentError::AnalysisFailed);
            }
        };

        let analysis = StoredAnalysis {
            document_id: doc.id.clone(),
            confidence_score: confidence_score(&result),
            result,
            created_at: Utc::now(),
        };

        if let Err(e) = self.complete(&doc, &analysis).await {
            warn!("Could not record analysis of document {}: {}", doc.id, e);
            self.mark_failed(&doc.id).await;
            return Err(e);
        }

        info!(
            "Document {} completed with confidence {:.2}",
            doc.id, analysis.confidence_score
        );
        Ok(analysis)
    }

    /// The document and its analysis, once completed.
    pub async fn results(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<(Document, StoredAnalysis), DocumentError> {
        let doc = self.get(user_id, document_id).await?;
        if doc.status != DocumentStatus::Completed {
            return Err(DocumentError::ResultsNotReady);
        }

        let analysis = self
            .ctx
            .analyses()
            .get(&doc.id)
            .await?
            .ok_or(DocumentError::ResultsNotReady)?;
        Ok((doc, analysis))
    }

    /// Remove a document, its analysis, and its stored file.
    pub async fn delete(&self, user_id: &str, document_id: &str) -> Result<(), DocumentError> {
        let doc = self.get(user_id, document_id).await?;

        self.ctx.analyses().delete(&doc.id).await?;
        self.ctx.documents().delete(&doc.id).await?;
        self.store.remove(&doc.file_path).await?;

        info!("Deleted document {}", doc.id);
        Ok(())
    }

    /// Move documents stuck in `processing` longer than `older_than` to `failed`.
    pub async fn reclaim_stale(&self, older_than: Duration) -> Result<Vec<Document>, DocumentError> {
        let cutoff = Utc::now() - older_than;
        let stale = self.ctx.documents().stale_processing(cutoff).await?;

        let mut reclaimed = Vec::with_capacity(stale.len());
        for mut doc in stale {
            if self
                .ctx
                .documents()
                .set_status(&doc.id, DocumentStatus::Failed)
                .await?
            {
                info!("Reclaimed stale document {} (processing since {})", doc.id, doc.updated_at);
                doc.status = DocumentStatus::Failed;
                reclaimed.push(doc);
            }
        }
        Ok(reclaimed)
    }

    /// Plan usage for an account.
    pub async fn account(&self, user_id: &str) -> Result<Usage, DocumentError> {
        self.limiter.usage(user_id).await
    }

    async fn run_attempt(&self, doc: &Document) -> Result<AnalysisResult, AttemptError> {
        let text = self
            .extractor
            .extract_async(&doc.file_path, Some(&doc.mime_type))
            .await?;
        Ok(self.analyzer.analyze(&text).await?)
    }

    async fn complete(&self, doc: &Document, analysis: &StoredAnalysis) -> Result<(), DocumentError> {
        self.ctx.analyses().save(analysis).await?;
        self.ctx
            .documents()
            .set_status(&doc.id, DocumentStatus::Completed)
            .await?;
        self.ctx.users().increment_processed(&doc.user_id).await?;
        Ok(())
    }

    /// Best effort: leave the document retryable with no analysis attached.
    async fn mark_failed(&self, document_id: &str) {
        if let Err(e) = self.ctx.analyses().delete(document_id).await {
            warn!("Could not clear analysis for {}: {}", document_id, e);
        }
        if let Err(e) = self
            .ctx
            .documents()
            .set_status(document_id, DocumentStatus::Failed)
            .await
        {
            warn!("Could not mark document {} failed: {}", document_id, e);
        }
    }
}
