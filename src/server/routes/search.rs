use crate::search::SearchOutcome;
use crate::server::error::{ApiError, ApiResult};
use crate::server::state::AppState;
use crate::store::ScoredRecord;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Search request.
///
/// The original wire protocol named the result bound "offset" even though it
/// is a limit; the alias keeps old clients working while new ones say
/// `limit`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub question: String,

    /// Maximum number of results (default 5).
    #[serde(default, alias = "offset")]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ScoredRecord>,
}

/// Rank stored records by distance to the query embedding.
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.search.search(&request.question, request.limit).await?;

    match outcome {
        SearchOutcome::Hits(results) => Ok(Json(SearchResponse { results })),
        // Empty store: not-found at the HTTP boundary, per the original API.
        SearchOutcome::Empty => Err(ApiError::NotFound),
    }
}
