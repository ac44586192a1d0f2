//! API error types and their wire rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use ytdl_models::ErrorCode;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rate limited")]
    RateLimited,

    #[error("Job not found")]
    JobNotFound,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Queue error: {0}")]
    Queue(#[from] ytdl_queue::QueueError),
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::JobNotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) | ApiError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> ErrorCode {
        match self {
            ApiError::Unauthorized => ErrorCode::Unauthorized,
            ApiError::RateLimited => ErrorCode::RateLimited,
            ApiError::JobNotFound => ErrorCode::JobNotFound,
            ApiError::InvalidUrl(_) => ErrorCode::InvalidUrl,
            ApiError::Internal(_) | ApiError::Queue(_) => ErrorCode::InternalError,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error_code: ErrorCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Internal details stay in the logs, not on the wire.
        let message = match &self {
            ApiError::Internal(_) | ApiError::Queue(_) => code.default_message().to_string(),
            ApiError::InvalidUrl(reason) => {
                format!("{} ({reason})", code.default_message())
            }
            _ => code.default_message().to_string(),
        };

        let body = ErrorResponse {
            error_code: code,
            message,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_error_classes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(ApiError::JobNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidUrl("bad host".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let response = ApiError::internal("redis connection pool exhausted").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
