use crate::ingest::RawRow;
use crate::server::error::ApiResult;
use crate::server::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Batch ingestion request: parsed tabular rows.
///
/// Tabular-file parsing happens upstream of this service; the boundary
/// consumes row tuples. Rows with missing fields fail the whole batch.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub rows: Vec<RawRow>,
}

/// Accepted-for-processing response.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub job_id: Uuid,
    /// Validated rows queued for embedding and persistence.
    pub rows: usize,
    pub message: String,
}

/// Accept a batch for background ingestion.
///
/// Validation is synchronous; on success the batch is queued and `202` is
/// returned before any embedding work starts. Late failures are observable
/// via `GET /api/v1/jobs/{id}`, never via this response.
pub async fn ingest_batch(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> ApiResult<impl IntoResponse> {
    let record = state.jobs.submit(&request.rows)?;

    tracing::info!(
        job_id = %record.id,
        rows = record.rows,
        "batch accepted, processing in the background"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            job_id: record.id,
            rows: record.rows,
            message: "Batch accepted. Processing is running in the background.".to_string(),
        }),
    ))
}
