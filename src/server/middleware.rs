use crate::server::error::ApiError;
use crate::server::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use subtle::ConstantTimeEq;

/// HTTP basic-auth middleware for the protected API routes.
///
/// Credentials come from configuration; comparison is constant-time.
pub async fn basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .ok_or_else(|| {
            ApiError::Authentication("credentials required (HTTP basic auth)".to_string())
        })?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(header)
        .map_err(|_| ApiError::Authentication("malformed credentials".to_string()))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| ApiError::Authentication("malformed credentials".to_string()))?;

    let (user, password) = decoded
        .split_once(':')
        .ok_or_else(|| ApiError::Authentication("malformed credentials".to_string()))?;

    let cfg = &state.config.server;
    let user_ok: bool = user.as_bytes().ct_eq(cfg.auth_username.as_bytes()).into();
    let pass_ok: bool = password.as_bytes().ct_eq(cfg.auth_password.as_bytes()).into();
    if !(user_ok && pass_ok) {
        return Err(ApiError::Authentication("invalid credentials".to_string()));
    }

    Ok(next.run(request).await)
}

/// Request ID injection middleware
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Logging middleware
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let request_id = request
        .extensions()
        .get::<String>()
        .cloned()
        .unwrap_or_default();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        "Request started"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}
