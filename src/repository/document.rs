//! Diesel-based document repository.
//!
//! Every lookup the HTTP layer performs is scoped to the owning user; the
//! unscoped `get` is for the CLI and maintenance paths.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::path::PathBuf;

use super::models::{DocumentRecord, NewDocument};
use super::parse_datetime;
use super::pool::{DbError, DbPool};
use crate::models::{Document, DocumentStatus, DocumentSummary};
use crate::schema::{analyses, documents};
use crate::with_conn;

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        Document {
            id: record.id,
            user_id: record.user_id,
            filename: record.filename,
            file_path: PathBuf::from(record.file_path),
            mime_type: record.mime_type,
            file_size: record.file_size.max(0) as u64,
            status: DocumentStatus::from_str(&record.status).unwrap_or(DocumentStatus::Failed),
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

/// Diesel-based document repository.
#[derive(Clone)]
pub struct DieselDocumentRepository {
    pool: DbPool,
}

impl DieselDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new document.
    pub async fn create(&self, doc: &Document) -> Result<(), DbError> {
        let file_path = doc.file_path.to_string_lossy();
        let created_at = doc.created_at.to_rfc3339();
        let updated_at = doc.updated_at.to_rfc3339();
        let new_doc = NewDocument {
            id: &doc.id,
            user_id: &doc.user_id,
            filename: &doc.filename,
            file_path: &file_path,
            mime_type: &doc.mime_type,
            file_size: doc.file_size as i64,
            status: doc.status.as_str(),
            created_at: &created_at,
            updated_at: &updated_at,
        };

        with_conn!(self.pool, conn => {
            diesel::insert_into(documents::table)
                .values(&new_doc)
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    /// Get a document by ID regardless of owner.
    pub async fn get(&self, id: &str) -> Result<Option<Document>, DbError> {
        with_conn!(self.pool, conn => {
            documents::table
                .find(id)
                .first::<DocumentRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Document::from))
        })
    }

    /// Get a document owned by `user_id`.
    pub async fn get_for_user(&self, id: &str, user_id: &str) -> Result<Option<Document>, DbError> {
        with_conn!(self.pool, conn => {
            documents::table
                .filter(documents::id.eq(id))
                .filter(documents::user_id.eq(user_id))
                .first::<DocumentRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Document::from))
        })
    }

    /// List a user's documents, newest first, with their confidence score.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<DocumentSummary>, DbError> {
        let rows: Vec<(DocumentRecord, Option<f64>)> = with_conn!(self.pool, conn => {
            documents::table
                .left_join(analyses::table)
                .filter(documents::user_id.eq(user_id))
                .order(documents::created_at.desc())
                .select((
                    DocumentRecord::as_select(),
                    analyses::confidence_score.nullable(),
                ))
                .load(&mut conn)
                .await
        })?;

        Ok(rows
            .into_iter()
            .map(|(record, confidence_score)| {
                let doc = Document::from(record);
                DocumentSummary {
                    id: doc.id,
                    filename: doc.filename,
                    status: doc.status,
                    file_size: doc.file_size,
                    confidence_score,
                    created_at: doc.created_at,
                }
            })
            .collect())
    }

    /// Set a document's status and touch `updated_at`.
    pub async fn set_status(&self, id: &str, status: DocumentStatus) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        with_conn!(self.pool, conn => {
            let rows = diesel::update(documents::table.find(id))
                .set((
                    documents::status.eq(status.as_str()),
                    documents::updated_at.eq(&now),
                ))
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }

    /// Documents stuck in `processing` since before `cutoff`.
    pub async fn stale_processing(&self, cutoff: DateTime<Utc>) -> Result<Vec<Document>, DbError> {
        let records: Vec<DocumentRecord> = with_conn!(self.pool, conn => {
            documents::table
                .filter(documents::status.eq(DocumentStatus::Processing.as_str()))
                .load::<DocumentRecord>(&mut conn)
                .await
        })?;

        Ok(records
            .into_iter()
            .map(Document::from)
            .filter(|doc| doc.updated_at < cutoff)
            .collect())
    }

    /// Count documents by status, optionally for one user.
    pub async fn count_by_status(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<(String, i64)>, DbError> {
        let statuses: Vec<String> = with_conn!(self.pool, conn => {
            let mut query = documents::table.select(documents::status).into_boxed();
            if let Some(user_id) = user_id {
                query = query.filter(documents::user_id.eq(user_id));
            }
            query.load::<String>(&mut conn).await
        })?;

        let mut counts: std::collections::BTreeMap<String, i64> = Default::default();
        for status in statuses {
            *counts.entry(status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    /// Delete a document row.
    pub async fn delete(&self, id: &str) -> Result<bool, DbError> {
        with_conn!(self.pool, conn => {
            let rows = diesel::delete(documents::table.find(id))
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::repository::DbContext;
    use chrono::Duration;
    use tempfile::tempdir;

    async fn setup() -> (tempfile::TempDir, DbContext, User) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let user = User::new("owner@example.com", "Owner");
        ctx.users().create(&user).await.unwrap();
        (dir, ctx, user)
    }

    fn sample(user: &User, name: &str) -> Document {
        Document::new(
            &user.id,
            name,
            PathBuf::from(format!("/uploads/{name}")),
            "application/pdf",
            1024,
        )
    }

    #[tokio::test]
    async fn test_create_and_scoped_get() {
        let (_dir, ctx, user) = setup().await;
        let repo = ctx.documents();
        let doc = sample(&user, "nda.pdf");
        repo.create(&doc).await.unwrap();

        let loaded = repo.get_for_user(&doc.id, &user.id).await.unwrap().unwrap();
        assert_eq!(loaded.filename, "nda.pdf");
        assert_eq!(loaded.status, DocumentStatus::Pending);
        assert_eq!(loaded.file_size, 1024);

        assert!(repo.get_for_user(&doc.id, "someone-else").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_status_and_list() {
        let (_dir, ctx, user) = setup().await;
        let repo = ctx.documents();
        let doc = sample(&user, "lease.pdf");
        repo.create(&doc).await.unwrap();

        assert!(repo.set_status(&doc.id, DocumentStatus::Processing).await.unwrap());
        assert!(!repo.set_status("missing", DocumentStatus::Failed).await.unwrap());

        let listed = repo.list_for_user(&user.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, DocumentStatus::Processing);
        assert_eq!(listed[0].confidence_score, None);

        let counts = repo.count_by_status(Some(&user.id)).await.unwrap();
        assert_eq!(counts, vec![("processing".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_stale_processing_filters_by_age() {
        let (_dir, ctx, user) = setup().await;
        let repo = ctx.documents();
        let doc = sample(&user, "old.pdf");
        repo.create(&doc).await.unwrap();
        repo.set_status(&doc.id, DocumentStatus::Processing).await.unwrap();

        let past = Utc::now() - Duration::hours(1);
        assert!(repo.stale_processing(past).await.unwrap().is_empty());

        let future = Utc::now() + Duration::seconds(5);
        let stale = repo.stale_processing(future).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, doc.id);
    }
}
