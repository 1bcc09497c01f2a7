//! Analysis persistence.
//!
//! List fields are stored as JSON text; an analysis reads back field-for-field
//! equal to what was saved, empty lists included.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{AnalysisRecord, NewAnalysis};
use super::parse_datetime;
use super::pool::{DbError, DbPool};
use super::util::json_error;
use crate::models::{AnalysisResult, StoredAnalysis};
use crate::schema::analyses;
use crate::with_conn;

impl TryFrom<AnalysisRecord> for StoredAnalysis {
    type Error = diesel::result::Error;

    fn try_from(record: AnalysisRecord) -> Result<Self, Self::Error> {
        Ok(StoredAnalysis {
            document_id: record.document_id,
            result: AnalysisResult {
                summary: record.summary,
                parties: serde_json::from_str(&record.parties).map_err(json_error)?,
                dates: serde_json::from_str(&record.dates).map_err(json_error)?,
                financial_terms: serde_json::from_str(&record.financial_terms)
                    .map_err(json_error)?,
                obligations: serde_json::from_str(&record.obligations).map_err(json_error)?,
                risks: serde_json::from_str(&record.risks).map_err(json_error)?,
                termination_conditions: serde_json::from_str(&record.termination_conditions)
                    .map_err(json_error)?,
            },
            confidence_score: record.confidence_score,
            created_at: parse_datetime(&record.created_at),
        })
    }
}

/// Diesel-based analysis repository.
#[derive(Clone)]
pub struct DieselAnalysisRepository {
    pool: DbPool,
}

impl DieselAnalysisRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Save an analysis, replacing any previous one for the same document.
    pub async fn save(&self, analysis: &StoredAnalysis) -> Result<(), DbError> {
        let result = &analysis.result;
        let parties = serde_json::to_string(&result.parties).map_err(json_error)?;
        let dates = serde_json::to_string(&result.dates).map_err(json_error)?;
        let financial_terms = serde_json::to_string(&result.financial_terms).map_err(json_error)?;
        let obligations = serde_json::to_string(&result.obligations).map_err(json_error)?;
        let risks = serde_json::to_string(&result.risks).map_err(json_error)?;
        let termination_conditions =
            serde_json::to_string(&result.termination_conditions).map_err(json_error)?;
        let created_at = analysis.created_at.to_rfc3339();

        let new_analysis = NewAnalysis {
            document_id: &analysis.document_id,
            summary: &result.summary,
            parties: &parties,
            dates: &dates,
            financial_terms: &financial_terms,
            obligations: &obligations,
            risks: &risks,
            termination_conditions: &termination_conditions,
            confidence_score: analysis.confidence_score,
            created_at: &created_at,
        };

        with_conn!(self.pool, conn => {
            diesel::delete(analyses::table.find(&analysis.document_id))
                .execute(&mut conn)
                .await?;
            diesel::insert_into(analyses::table)
                .values(&new_analysis)
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    /// Get the analysis for a document.
    pub async fn get(&self, document_id: &str) -> Result<Option<StoredAnalysis>, DbError> {
        with_conn!(self.pool, conn => {
            analyses::table
                .find(document_id)
                .first::<AnalysisRecord>(&mut conn)
                .await
                .optional()
                .and_then(|opt| opt.map(StoredAnalysis::try_from).transpose())
        })
    }

    /// Delete the analysis for a document.
    pub async fn delete(&self, document_id: &str) -> Result<bool, DbError> {
        with_conn!(self.pool, conn => {
            let rows = diesel::delete(analyses::table.find(document_id))
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, Party, Risk, TerminationCondition, User};
    use crate::repository::DbContext;
    use chrono::Utc;
    use std::path::PathBuf;
    use tempfile::tempdir;

    async fn setup() -> (tempfile::TempDir, DbContext, Document) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let user = User::new("owner@example.com", "Owner");
        ctx.users().create(&user).await.unwrap();
        let doc = Document::new(
            &user.id,
            "msa.docx",
            PathBuf::from("/uploads/msa.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            2048,
        );
        ctx.documents().create(&doc).await.unwrap();
        (dir, ctx, doc)
    }

    #[tokio::test]
    async fn test_round_trip_keeps_empty_lists() {
        let (_dir, ctx, doc) = setup().await;
        let repo = ctx.analyses();

        let stored = StoredAnalysis {
            document_id: doc.id.clone(),
            result: AnalysisResult {
                summary: "Master services agreement".to_string(),
                parties: vec![Party {
                    name: "Acme Corp".to_string(),
                    role: "Vendor".to_string(),
                    kind: "company".to_string(),
                }],
                risks: vec![Risk {
                    kind: "liability".to_string(),
                    description: "Uncapped indemnity".to_string(),
                    severity: "high".to_string(),
                    recommendation: "Negotiate a cap".to_string(),
                }],
                termination_conditions: vec![
                    TerminationCondition::Text("30 days notice".to_string()),
                    TerminationCondition::Structured(
                        serde_json::json!({"for_cause": true})
                            .as_object()
                            .cloned()
                            .unwrap(),
                    ),
                ],
                ..AnalysisResult::default()
            },
            confidence_score: 0.6,
            created_at: Utc::now(),
        };
        repo.save(&stored).await.unwrap();

        let loaded = repo.get(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.result, stored.result);
        assert_eq!(loaded.confidence_score, 0.6);
        assert!(loaded.result.dates.is_empty());
        assert!(loaded.result.obligations.is_empty());

        let json = serde_json::to_value(&loaded).unwrap();
        assert_eq!(json["financial_terms"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_save_replaces_and_delete() {
        let (_dir, ctx, doc) = setup().await;
        let repo = ctx.analyses();

        let mut stored = StoredAnalysis {
            document_id: doc.id.clone(),
            result: AnalysisResult::default(),
            confidence_score: 0.0,
            created_at: Utc::now(),
        };
        repo.save(&stored).await.unwrap();
        stored.confidence_score = 0.2;
        repo.save(&stored).await.unwrap();

        assert_eq!(repo.get(&doc.id).await.unwrap().unwrap().confidence_score, 0.2);
        assert!(repo.delete(&doc.id).await.unwrap());
        assert!(repo.get(&doc.id).await.unwrap().is_none());
    }
}
