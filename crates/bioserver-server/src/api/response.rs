//! API response types
//!
//! Listings are wrapped as `{"data": [...]}`; errors are
//! `{"error": {"code": ..., "message": ...}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Standard success response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Standard error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    /// Respond with `status` and this body
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }

    /// 500 with a generic message; the cause is logged, not returned
    pub fn internal(cause: &dyn std::fmt::Display) -> Response {
        tracing::error!("Database error: {}", cause);
        Self::new("INTERNAL_ERROR", "A database error occurred")
            .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let body = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(body, json!({ "data": [1, 2] }));
    }

    #[test]
    fn test_error_shape() {
        let body = serde_json::to_value(ErrorResponse::new("NOT_FOUND", "nope")).unwrap();
        assert_eq!(body, json!({ "error": { "code": "NOT_FOUND", "message": "nope" } }));
    }

    #[test]
    fn test_internal_hides_cause() {
        let response = ErrorResponse::internal(&"connection refused");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
