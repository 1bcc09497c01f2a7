//! Document upload, analysis, and results handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use super::super::error::ApiError;
use super::super::{AppState, AuthUser};
use crate::models::{Document, DocumentStatus};
use crate::storage::UploadError;

/// Multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "document";

/// A document as returned to its owner. The storage path stays server-side.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub file_size: u64,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename,
            mime_type: doc.mime_type,
            file_size: doc.file_size,
            status: doc.status,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// Accept a PDF or DOCX upload.
pub async fn upload_document(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&state, e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("document").to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(&state, e))?;

        let doc = state
            .documents
            .upload(&user.id, &filename, content_type.as_deref(), &data)
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Document uploaded successfully",
                "document": DocumentResponse::from(doc),
            })),
        ));
    }

    Err(ApiError::bad_request("No file uploaded"))
}

/// The caller's documents with their scores.
pub async fn list_documents(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let documents = state.documents.list(&user.id).await?;
    Ok(Json(json!({ "documents": documents })))
}

/// Run analysis on a pending or failed document.
pub async fn analyze_document(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(doc_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let analysis = state.documents.analyze(&user.id, &doc_id).await?;
    Ok(Json(json!({
        "message": "Document analyzed successfully",
        "analysis": analysis,
    })))
}

/// A completed document with its analysis.
pub async fn document_results(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(doc_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (doc, analysis) = state.documents.results(&user.id, &doc_id).await?;
    Ok(Json(json!({
        "document": DocumentResponse::from(doc),
        "analysis": analysis,
    })))
}

/// Delete a document and everything stored for it.
pub async fn delete_document(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(doc_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.documents.delete(&user.id, &doc_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn multipart_error(state: &AppState, e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::bad_request(UploadError::TooLarge(state.max_upload_bytes).to_string());
    }
    ApiError::bad_request(e.body_text())
}
