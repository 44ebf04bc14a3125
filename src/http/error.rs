//! HTTP error responses.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete submission (400).
    #[error("{0}")]
    BadRequest(String),

    /// Caller exhausted its quota for the current window (429).
    #[error("Too many requests, retry in {retry_after_secs}s")]
    TooManyRequests {
        /// Whole seconds until the caller's window resets
        retry_after_secs: u64,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::TooManyRequests { retry_after_secs } => {
                let body = Json(json!({
                    "error": "Too many requests. Please try again later.",
                    "remaining": 0,
                    "retryAfter": retry_after_secs,
                }));
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_status() {
        let response = ApiError::BadRequest("name is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_too_many_requests_sets_retry_after() {
        let response = ApiError::TooManyRequests {
            retry_after_secs: 42,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }
}
