// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // 400 Bad Request
    ValidationError {
        message: String,
        detail: Option<String>,
        field_errors: BTreeMap<String, String>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 413 Payload Too Large
    PayloadTooLarge {
        message: String,
        detail: Option<String>,
    },

    // 500 Internal Server Error
    InternalServerError {
        message: String,
        detail: Option<String>,
    },

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::PayloadTooLarge { message, .. } => message,
            ApiError::InternalServerError { message, .. } => message,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body: `{message, detail?, field_errors?}`
    pub fn to_json(&self) -> Value {
        let mut response = json!({ "message": self.message() });

        match self {
            ApiError::ValidationError { detail, field_errors, .. } => {
                if let Some(detail) = detail {
                    response["detail"] = json!(detail);
                }
                if !field_errors.is_empty() {
                    response["field_errors"] = json!(field_errors);
                }
            }
            ApiError::InternalServerError { detail: Some(detail), .. }
            | ApiError::PayloadTooLarge { detail: Some(detail), .. } => {
                response["detail"] = json!(detail);
            }
            _ => {}
        }

        response
    }
}

impl ApiError {
    pub fn validation_error(
        message: impl Into<String>,
        detail: Option<String>,
        field_errors: BTreeMap<String, String>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            detail,
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn payload_too_large(message: impl Into<String>, detail: Option<String>) -> Self {
        ApiError::PayloadTooLarge {
            message: message.into(),
            detail,
        }
    }

    pub fn internal_server_error(message: impl Into<String>, detail: Option<String>) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            detail,
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<crate::pages::ValidationError> for ApiError {
    fn from(err: crate::pages::ValidationError) -> Self {
        let detail = err.to_string();
        ApiError::validation_error("Invalid page payload", Some(detail), err.field_errors())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
