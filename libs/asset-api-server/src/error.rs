use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use asset_engine::{ServiceError, ValidationError};

/// JSON error body: `{"error": "...", "kind": "..."}`.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    kind: &'a str,
}

/// Error returned by every handler. The message is safe to show to the
/// client; storage details stay in the logs.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self { status, kind, message: message.into() }
    }

    pub(crate) fn no_file() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "no_file", "No file uploaded")
    }

    pub(crate) fn validation(e: &ValidationError) -> Self {
        let status = match e {
            ValidationError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ValidationError::UnsupportedFormat | ValidationError::EmptyPayload => StatusCode::BAD_REQUEST,
        };
        Self::new(status, e.kind(), e.to_string())
    }

    /// Malformed multipart body, or the body limit tripped mid-stream.
    pub(crate) fn multipart(e: MultipartError, max_bytes: u64) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::validation(&ValidationError::PayloadTooLarge { limit: max_bytes });
        }
        tracing::warn!(error = %e.body_text(), "malformed upload body");
        Self::new(StatusCode::BAD_REQUEST, "bad_request", e.body_text())
    }

    /// Map a service error, using `storage_message` for opaque failures.
    pub(crate) fn service(e: ServiceError, storage_message: &'static str) -> Self {
        match e {
            ServiceError::Validation(v) => Self::validation(&v),
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "not_found", "Model not found"),
            ServiceError::Storage(s) => {
                tracing::error!(error = %s, "{storage_message}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage", storage_message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            kind: self.kind,
        };
        (self.status, axum::Json(body)).into_response()
    }
}
