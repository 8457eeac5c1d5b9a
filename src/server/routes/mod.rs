pub mod health;
pub mod ingest;
pub mod jobs;
pub mod search;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API root: service identity and route map.
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "service": "semqa",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "ingest": "POST /api/v1/ingest",
            "job_status": "GET /api/v1/jobs/{id}",
            "search": "POST /api/v1/search",
            "health": "GET /health",
            "metrics": "GET /metrics",
        }
    }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "code": "NOT_FOUND",
                "message": "Unknown route",
            }
        })),
    )
}
