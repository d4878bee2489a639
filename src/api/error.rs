//! Error responses for the sensor API.
//!
//! Every failure is returned as `{ "error": "<message>" }`. Client mistakes
//! map to 400; storage and scheduling failures map to 500 with a fixed
//! message per endpoint, the underlying cause going to the log only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// An HTTP error carrying its status and client-facing message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// A 500 with a fixed `message`; `cause` is logged, never returned.
    pub fn internal(message: &str, cause: &dyn std::error::Error) -> Self {
        tracing::error!(error = %cause, "{}", message);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }

    /// An extractor rejection (malformed JSON, bad path segment).
    pub fn rejected(rejection: impl std::fmt::Display) -> Self {
        Self::bad_request(rejection.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
        };
        (self.status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bad_request_shape() {
        let resp = ApiError::bad_request("sensor_id must not be empty").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v, serde_json::json!({"error": "sensor_id must not be empty"}));
    }

    #[tokio::test]
    async fn test_internal_hides_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let resp = ApiError::internal("Failed to record health check", &cause).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["error"], "Failed to record health check");
        assert!(!v.to_string().contains("disk on fire"));
    }
}
