//! Health and account handlers.

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use super::super::error::ApiError;
use super::super::{AppState, AuthUser};

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// The caller's account and plan usage.
pub async fn account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let usage = state.documents.account(&user.id).await?;
    Ok(Json(json!({
        "user": user,
        "usage": usage,
    })))
}
