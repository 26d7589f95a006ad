use axum::{body::Body, extract::State, http::HeaderMap};
use serde_json::Value;

use crate::auth::Credentials;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::pages::PageOutcome;
use crate::server::AppState;

/// POST /api/pages - Create a page owned by the authenticated caller
///
/// Expected Input:
/// ```json
/// { "title": "string", "content": "string" }
/// ```
///
/// Credentials come from `Authorization: Bearer <token>` or the session
/// cookie. Ownership is never read from the body, and the body is only read
/// once the caller is authenticated.
///
/// Responses:
/// - 201 `{ "message": "Page created successfully", "data": { ... } }`
/// - 400 `{ "message": "Invalid page payload", "detail": "...", "field_errors": { ... } }`
/// - 401 `{ "message": "Not authenticated" }`
/// - 413 `{ "message": "Request body too large", "detail": "..." }`
/// - 500 `{ "message": "Failed to create page", "detail": "..." }`
pub async fn create(State(state): State<AppState>, headers: HeaderMap, body: Body) -> ApiResult<Value> {
    let credentials = Credentials::from_headers(&headers, &state.session_cookie);

    let Some(user_id) = state.pages.authorize(&credentials).await else {
        return Err(ApiError::unauthorized("Not authenticated"));
    };

    let body = axum::body::to_bytes(body, state.max_body_bytes).await.map_err(|e| {
        tracing::warn!(user_id = %user_id, error = %e, limit = state.max_body_bytes, "page body not read");
        ApiError::payload_too_large(
            "Request body too large",
            Some(format!("limit is {} bytes", state.max_body_bytes)),
        )
    })?;

    match state.pages.create_for(&user_id, &body).await {
        PageOutcome::Created(record) => Ok(ApiResponse::created("Page created successfully", record)),
        PageOutcome::Unauthenticated => Err(ApiError::unauthorized("Not authenticated")),
        PageOutcome::ValidationFailure(e) => Err(e.into()),
        PageOutcome::PersistenceFailure { detail } => {
            Err(ApiError::internal_server_error("Failed to create page", Some(detail)))
        }
    }
}
