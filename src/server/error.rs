//! API error type with structured JSON responses.

use crate::error::{ErrorClass, StyleCopyError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error response body: `{"success": false, "error": {"code", "message"}}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] StyleCopyError),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Core(StyleCopyError::FileTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Core(StyleCopyError::ServiceStarting { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Core(e) => match e.class() {
                ErrorClass::ClientInput => StatusCode::BAD_REQUEST,
                ErrorClass::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                ErrorClass::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ErrorClass::Upstream => StatusCode::BAD_GATEWAY,
                ErrorClass::Processing | ErrorClass::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::PayloadTooLarge(_) => "FILE_TOO_LARGE",
            ApiError::Core(e) => match e {
                StyleCopyError::MissingFilename => "MISSING_FILENAME",
                StyleCopyError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
                StyleCopyError::FileTooLarge { .. } => "FILE_TOO_LARGE",
                StyleCopyError::DecodeFailed(_)
                | StyleCopyError::DocxExtraction(_)
                | StyleCopyError::PdfExtraction(_) => "EXTRACTION_FAILED",
                StyleCopyError::NoReferences => "NO_REFERENCES",
                StyleCopyError::EmptyDraft => "EMPTY_DRAFT",
                StyleCopyError::EmptyStyleGuide => "EMPTY_STYLE_GUIDE",
                StyleCopyError::ServiceUnavailable { .. } => "AI_UNAVAILABLE",
                StyleCopyError::ServiceStarting { .. } => "AI_STARTING",
                StyleCopyError::Timeout { .. } => "AI_TIMEOUT",
                StyleCopyError::UpstreamStatus { .. } => "AI_UPSTREAM_ERROR",
                StyleCopyError::EmptyResponse { .. } => "AI_EMPTY_RESPONSE",
                StyleCopyError::Processing(_) => "PROCESSING_ERROR",
                StyleCopyError::InvalidConfig(_)
                | StyleCopyError::Io(_)
                | StyleCopyError::Internal(_) => "INTERNAL",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Core(e) if e.class() == ErrorClass::Internal => {
                tracing::error!(error = %e, "API internal error");
                "An internal error occurred".to_string()
            }
            other => {
                if status.is_server_error() {
                    tracing::warn!(status = status.as_u16(), error = %other, "request failed");
                }
                other.to_string()
            }
        };

        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                code: self.code(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
