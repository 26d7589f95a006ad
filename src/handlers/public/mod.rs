// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service banner, liveness and the JSON 404 fallback.

use axum::extract::State;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// GET / - Service banner
pub async fn root() -> ApiResponse<Value> {
    let version = env!("CARGO_PKG_VERSION");

    ApiResponse::success(
        "Pages API is running",
        json!({
            "name": "pages-api",
            "version": version,
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "pages": "POST /api/pages (authenticated)",
            }
        }),
    )
}

/// GET /health - Liveness plus storage reachability
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => Ok(ApiResponse::success(
            "ok",
            json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            }),
        )),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            Err(ApiError::service_unavailable("Storage unavailable"))
        }
    }
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
