//! Route handlers. Each one is a thin adapter over [`StyleCopier`].

use crate::pipeline::input::{check_size, detect_format, UploadedFile};
use crate::server::error::ApiError;
use crate::server::types::*;
use crate::workflow::{ModelInfo, StyleCopier};
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::debug;

type AppState = State<Arc<StyleCopier>>;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

pub async fn health(State(copier): AppState) -> Json<HealthResponse> {
    let ai_service = copier.health_check().await;
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        ai_service,
        supported_formats: copier.config().supported_formats.extensions(),
    })
}

/// `POST /api/extract-text`.
///
/// The file field is read chunk by chunk and rejected as soon as it passes
/// the size ceiling, so an oversized upload is never fully buffered. The
/// extension is checked before the first chunk is read.
pub async fn extract_text(
    State(copier): AppState,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ExtractTextData>>, ApiError> {
    let config = copier.config();
    let limit = config.max_upload_bytes;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        detect_format(&filename, &config.supported_formats)?;

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            check_size((bytes.len() + chunk.len()) as u64, limit)?;
            bytes.extend_from_slice(&chunk);
        }
        debug!("Received upload '{}' ({} bytes)", filename, bytes.len());

        let extracted = copier
            .extract_upload(&UploadedFile::new(filename, bytes))
            .await?;
        return Ok(Json(ApiResponse::ok(
            ExtractTextData::from(extracted),
            "Text extracted successfully",
        )));
    }

    Err(ApiError::BadRequest(format!(
        "No file provided in multipart field '{FILE_FIELD}'"
    )))
}

pub async fn analyze_style(
    State(copier): AppState,
    body: Result<Json<AnalyzeStyleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<StyleGuideData>>, ApiError> {
    let Json(req) = body.map_err(json_error)?;
    let style_guide = copier.analyze_style(&req.reference_articles).await?;
    Ok(Json(ApiResponse::ok(
        StyleGuideData { style_guide },
        "Style analysis completed",
    )))
}

pub async fn edit_content(
    State(copier): AppState,
    body: Result<Json<EditContentRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<EditedContentData>>, ApiError> {
    let Json(req) = body.map_err(json_error)?;
    let edited_content = copier
        .edit_content(&req.draft_content, &req.style_guide)
        .await?;
    Ok(Json(ApiResponse::ok(
        EditedContentData { edited_content },
        "Content editing completed",
    )))
}

pub async fn generate_edit(
    State(copier): AppState,
    body: Result<Json<GenerateEditRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<GeneratedEditData>>, ApiError> {
    let Json(req) = body.map_err(json_error)?;
    let outcome = copier
        .generate_edit(&req.reference_articles, &req.draft_content)
        .await?;
    Ok(Json(ApiResponse::ok(
        GeneratedEditData {
            edited_article: outcome.edited_article,
            style_guide: outcome.style_guide,
        },
        "Article editing completed successfully",
    )))
}

pub async fn models(State(copier): AppState) -> Json<ModelInfo> {
    Json(copier.model_info())
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

fn json_error(e: JsonRejection) -> ApiError {
    ApiError::BadRequest(e.body_text())
}
