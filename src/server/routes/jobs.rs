use crate::server::error::{ApiError, ApiResult};
use crate::server::state::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

/// Poll an ingestion job by id.
///
/// This is the only place a detached ingestion failure surfaces to API
/// callers; the submitting request has already returned by the time a job
/// runs.
pub async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    match state.jobs.status(id) {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound),
    }
}
