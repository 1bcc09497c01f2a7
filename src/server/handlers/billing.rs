//! Billing event intake.

use axum::{extract::State, http::HeaderMap, Json};

use super::super::error::ApiError;
use super::super::AppState;
use crate::services::{BillingEvent, BillingOutcome};

/// Header carrying the shared billing secret.
pub const BILLING_SECRET_HEADER: &str = "x-billing-secret";

/// Apply a verified billing event.
pub async fn billing_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<BillingEvent>,
) -> Result<Json<BillingOutcome>, ApiError> {
    let Some(expected) = state.billing_secret.as_deref() else {
        return Err(ApiError::not_found("Billing is not configured"));
    };

    let provided = headers
        .get(BILLING_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        tracing::warn!("Rejected billing event with bad secret");
        return Err(ApiError::unauthorized("Invalid billing secret"));
    }

    let outcome = state.billing.apply(&event).await?;
    Ok(Json(outcome))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
