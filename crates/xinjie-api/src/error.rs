//! API error types and JSON error response formatting.
//!
//! ApiError maps the service error taxonomy onto HTTP status codes. Only
//! validation and not-found messages reach the client verbatim; upstream
//! and storage details are logged and replaced with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use xinjie_core::error::XinjieError;

const TRY_AGAIN_LATER: &str = "Service temporarily unavailable, please try again later";

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// 400 - missing or invalid input.
    BadRequest(String),
    /// 404 - no such record or route.
    NotFound(String),
    /// 502 - the interpretation API failed.
    BadGateway(String),
    /// 500 - storage or other server-side failure.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "upstream_unavailable", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<XinjieError> for ApiError {
    fn from(err: XinjieError) -> Self {
        match err {
            XinjieError::Validation(msg) => ApiError::BadRequest(msg),
            XinjieError::NotFound(msg) => ApiError::NotFound(msg),
            XinjieError::Upstream(detail) => {
                warn!(error = %detail, "Upstream failure");
                ApiError::BadGateway(TRY_AGAIN_LATER.to_string())
            }
            other => {
                error!(error = %other, "Request failed");
                ApiError::Internal(TRY_AGAIN_LATER.to_string())
            }
        }
    }
}
