//! Router configuration for the web server.

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use super::AppState;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let body_limit = (state.max_upload_bytes + MULTIPART_OVERHEAD) as usize;
    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/account", get(handlers::account))
        // Documents
        .route("/api/documents", get(handlers::list_documents))
        .route("/api/documents/upload", post(handlers::upload_document))
        .route("/api/documents/:doc_id", delete(handlers::delete_document))
        .route(
            "/api/documents/:doc_id/analyze",
            post(handlers::analyze_document),
        )
        .route(
            "/api/documents/:doc_id/results",
            get(handlers::document_results),
        )
        // Billing
        .route("/api/billing/events", post(handlers::billing_event))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
