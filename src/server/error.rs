//! JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::repository::DbError;
use crate::services::DocumentError;

/// An error rendered as `{"error": message}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<DocumentError> for ApiError {
    fn from(e: DocumentError) -> Self {
        let status = match &e {
            DocumentError::PlanLimitReached => StatusCode::FORBIDDEN,
            DocumentError::AlreadyProcessing
            | DocumentError::AlreadyAnalyzed
            | DocumentError::ResultsNotReady
            | DocumentError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            DocumentError::NotFound => StatusCode::NOT_FOUND,
            DocumentError::UserNotFound => StatusCode::UNAUTHORIZED,
            DocumentError::AnalysisFailed => StatusCode::INTERNAL_SERVER_ERROR,
            DocumentError::Storage(_) | DocumentError::Database(_) => {
                tracing::error!("Request failed: {}", e);
                return Self::internal();
            }
        };
        Self::new(status, e.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        tracing::error!("Database error: {}", e);
        Self::internal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_error_statuses() {
        let cases = [
            (DocumentError::PlanLimitReached, StatusCode::FORBIDDEN),
            (DocumentError::AlreadyProcessing, StatusCode::BAD_REQUEST),
            (DocumentError::ResultsNotReady, StatusCode::BAD_REQUEST),
            (DocumentError::NotFound, StatusCode::NOT_FOUND),
            (DocumentError::AnalysisFailed, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "/srv/uploads is full");
        let api = ApiError::from(DocumentError::Storage(io));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Internal server error");
    }

    #[test]
    fn test_plan_limit_message() {
        let api = ApiError::from(DocumentError::PlanLimitReached);
        assert!(api.message.starts_with("Monthly limit reached"));
    }
}
