use crate::ingest::IngestError;
use crate::jobs::SubmitError;
use crate::search::SearchError;
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

/// API-surface error types.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::Authentication(_) => "AUTH_FAILED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Unavailable(_) => "UNAVAILABLE",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));
        let mut response = (status, body).into_response();
        if matches!(self, ApiError::Authentication(_)) {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Basic realm=\"semqa\""),
            );
        }
        response
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::InvalidInput(msg) => ApiError::BadRequest(msg),
            SubmitError::QueueFull => ApiError::Unavailable("ingest queue is full".into()),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidQuery => {
                ApiError::BadRequest("query text must not be empty".into())
            }
            SearchError::Store(StoreError::Unavailable(_)) => {
                ApiError::Unavailable("vector store unavailable".into())
            }
            // Provider and persistence detail stays out of responses.
            SearchError::Embedding(_) | SearchError::Store(StoreError::Persistence(_)) => {
                ApiError::Internal
            }
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidInput(msg) => ApiError::BadRequest(msg),
            IngestError::Store(StoreError::Unavailable(_)) => {
                ApiError::Unavailable("vector store unavailable".into())
            }
            IngestError::Embedding(_) | IngestError::Store(StoreError::Persistence(_)) => {
                ApiError::Internal
            }
        }
    }
}
