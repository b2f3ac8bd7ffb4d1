//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::processor::PipelineError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file provided. Upload a PDF in the 'file' form field.")]
    MissingFile,
    #[error("Invalid file type. Only PDF files are supported. Received: {0}")]
    InvalidFileType(String),
    #[error("Uploaded file is empty")]
    EmptyFile,
    #[error("File size exceeds maximum allowed size of {limit_mb} MB")]
    PayloadTooLarge { limit_mb: usize },
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile
            | ApiError::InvalidFileType(_)
            | ApiError::EmptyFile
            | ApiError::MalformedUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Pipeline(PipelineError::Extraction(e)) if e.is_input_problem() => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Pipeline(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable upper-case token for clients.
    pub fn code(&self) -> String {
        match self {
            ApiError::MissingFile => "MISSING_FILE".into(),
            ApiError::InvalidFileType(_) => "INVALID_FILE_TYPE".into(),
            ApiError::EmptyFile => "EMPTY_FILE".into(),
            ApiError::PayloadTooLarge { .. } => "FILE_TOO_LARGE".into(),
            ApiError::MalformedUpload(_) => "BAD_REQUEST".into(),
            ApiError::Pipeline(e) => e.kind().to_ascii_uppercase(),
            ApiError::Internal(_) => "INTERNAL".into(),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Pipeline(PipelineError::Extraction(e)) if e.is_input_problem() => {
                format!("PDF extraction error: {e}")
            }
            ApiError::Pipeline(PipelineError::Extraction(_)) => {
                "Internal error: uploaded file could not be read back".to_string()
            }
            ApiError::Pipeline(PipelineError::Analysis(e)) => format!("Analysis error: {e}"),
            ApiError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.code(), error = %self, "Request failed");
        } else {
            tracing::warn!(code = %self.code(), error = %self, "Request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.message(),
            },
        };
        (status, Json(body)).into_response()
    }
}
