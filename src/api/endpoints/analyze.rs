//! Transcript upload and analysis endpoint.

use std::io::Write;
use std::time::Instant;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::analysis::AnalysisResult;
use crate::pipeline::processor::ProcessingOutcome;

const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub status: &'static str,
    pub filename: String,
    pub analysis: AnalysisResult,
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// `POST /analyze`: multipart upload with the PDF in the `file` field.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge {
                limit_mb: ctx.upload_limit_mb(),
            }
        } else {
            ApiError::MalformedUpload(e.body_text())
        }
    })?;
    let upload = read_upload(&ctx, &mut multipart).await?;

    if upload.bytes.is_empty() {
        return Err(ApiError::EmptyFile);
    }

    tracing::info!(
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        "Received transcript upload"
    );

    let start = Instant::now();
    let processor = ctx.processor.clone();
    let bytes = upload.bytes;
    let outcome = tokio::task::spawn_blocking(move || -> Result<ProcessingOutcome, ApiError> {
        let mut file = tempfile::Builder::new()
            .prefix("transcript-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| ApiError::Internal(format!("temp file: {e}")))?;
        file.write_all(&bytes)
            .and_then(|_| file.flush())
            .map_err(|e| ApiError::Internal(format!("temp file write: {e}")))?;

        let result = processor.process(file.path());

        if let Err(e) = file.close() {
            tracing::debug!(error = %e, "Temp file cleanup failed");
        }
        Ok(result?)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("processing task failed: {e}")))??;

    tracing::info!(
        filename = %upload.filename,
        method = ?outcome.extraction.method,
        pages = outcome.extraction.page_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Transcript analysis complete"
    );

    Ok(Json(AnalyzeResponse {
        status: "success",
        filename: upload.filename,
        analysis: outcome.analysis,
    }))
}

/// Pull the `file` field, checking its type and size while streaming.
async fn read_upload(ctx: &ApiContext, multipart: &mut Multipart) -> Result<Upload, ApiError> {
    let to_api_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge {
                limit_mb: ctx.upload_limit_mb(),
            }
        } else {
            ApiError::MalformedUpload(e.body_text())
        }
    };

    while let Some(mut field) = multipart.next_field().await.map_err(to_api_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or("").to_string();
        if !is_pdf_content_type(&content_type) {
            let received = if content_type.is_empty() {
                "none".to_string()
            } else {
                content_type
            };
            return Err(ApiError::InvalidFileType(received));
        }

        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(to_api_error)? {
            if bytes.len() + chunk.len() > ctx.max_upload_bytes {
                return Err(ApiError::PayloadTooLarge {
                    limit_mb: ctx.upload_limit_mb(),
                });
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(Upload { filename, bytes });
    }

    Err(ApiError::MissingFile)
}

/// `application/pdf`, ignoring case and any parameters.
fn is_pdf_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_content_type_matching() {
        assert!(is_pdf_content_type("application/pdf"));
        assert!(is_pdf_content_type("Application/PDF"));
        assert!(is_pdf_content_type("application/pdf; name=call.pdf"));
        assert!(!is_pdf_content_type("application/octet-stream"));
        assert!(!is_pdf_content_type("text/plain"));
        assert!(!is_pdf_content_type(""));
    }
}
