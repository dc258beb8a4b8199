//! API error types and JSON error response formatting.
//!
//! ApiError gives every endpoint the same `{error, message}` body and maps
//! chat failures onto HTTP status codes.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ldm_chat::ChatError;
use serde::{Deserialize, Serialize};

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "bad_gateway").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid input.
    BadRequest(String),
    /// 413 Payload Too Large - request body over the configured limit.
    PayloadTooLarge(String),
    /// 415 Unsupported Media Type - body sent without a JSON content type.
    UnsupportedMediaType(String),
    /// 429 Too Many Requests - global rate limit exceeded.
    TooManyRequests(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502 Bad Gateway - the language-model backend failed.
    BadGateway(String),
    /// 503 Service Unavailable - backend not configured.
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, message) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg),
            ApiError::PayloadTooLarge(msg) => ("payload_too_large", msg),
            ApiError::UnsupportedMediaType(msg) => ("unsupported_media_type", msg),
            ApiError::TooManyRequests(msg) => ("too_many_requests", msg),
            ApiError::Internal(msg) => ("internal_error", msg),
            ApiError::BadGateway(msg) => ("bad_gateway", msg),
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), %message, "Request failed");
        }

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(rejection.body_text()),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => {
                ApiError::UnsupportedMediaType(rejection.body_text())
            }
            _ => ApiError::BadRequest(rejection.body_text()),
        }
    }
}

/// Client-facing messages for server-side failures. The underlying error
/// is logged, not returned.
const UPSTREAM_FAILED: &str = "The language model service failed to respond";
const UPSTREAM_UNUSABLE: &str = "The language model returned an unusable reply";
const BACKEND_UNAVAILABLE: &str = "The language model backend is not available";
const INTERNAL_FAILURE: &str = "Internal server error";

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        if matches!(err, ChatError::EmptyQuery | ChatError::QueryTooLong(_)) {
            return ApiError::BadRequest(err.to_string());
        }

        tracing::warn!(error = %err, "Chat request failed");
        match err {
            ChatError::Config(_) => ApiError::ServiceUnavailable(BACKEND_UNAVAILABLE.to_string()),
            ChatError::MalformedModel(_) | ChatError::EmptyReply => {
                ApiError::BadGateway(UPSTREAM_UNUSABLE.to_string())
            }
            ChatError::Llm(_) | ChatError::UpstreamStatus { .. } => {
                ApiError::BadGateway(UPSTREAM_FAILED.to_string())
            }
            _ => ApiError::Internal(INTERNAL_FAILURE.to_string()),
        }
    }
}
