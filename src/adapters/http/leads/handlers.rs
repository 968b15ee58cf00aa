//! HTTP handlers for lead capture.

use axum::extract::{Json, State};
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::{AppState, JsonBody};

use super::dto::{CaptureLeadRequest, CaptureLeadResponse};

/// POST /leads/capture - Upsert a lead by email
pub async fn capture_lead(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CaptureLeadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.capture_lead.handle(request.into()).await?;

    Ok(Json(CaptureLeadResponse { success: true }))
}
