//! Route handlers.
//!
//! Endpoints:
//! - GET  /health          - liveness plus dependency report
//! - POST /extract-images  - multipart field `pdf`
//! - POST /analyze-image   - multipart field `image`

use super::error::ApiError;
use super::AppState;
use crate::capabilities::DependencyReport;
use crate::harvest;
use crate::output::ImageRecord;
use crate::pipeline::input::{self, UploadProblem};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::{debug, info};

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub dependencies: DependencyReport,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub message: String,
    pub images: Vec<ImageRecord>,
    pub total_images: usize,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub image: ImageRecord,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "PDF Image Size Detector API is running",
        version: env!("CARGO_PKG_VERSION"),
        dependencies: state.capabilities.report(),
    })
}

/// POST /extract-images
pub async fn extract_images(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let upload = read_field(multipart, "pdf", input::validate_pdf_name)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No PDF file provided".into()))?;

    info!("Extracting images from '{}' ({} bytes)", upload.filename, upload.bytes.len());

    let output = harvest::harvest_pdf(upload.bytes, &state.config, &state.capabilities).await?;
    let total_images = output.images.len();

    Ok(Json(ExtractResponse {
        success: true,
        message: format!("Successfully extracted {} images", total_images),
        images: output.images,
        total_images,
    }))
}

/// POST /analyze-image
pub async fn analyze_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let upload = read_field(multipart, "image", input::validate_name)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No image file provided".into()))?;

    let image =
        harvest::analyze_image(upload.bytes, upload.filename, &state.config.encode_policy).await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        image,
    }))
}

// ============================================================================
// Multipart
// ============================================================================

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// Find the field called `wanted`, validate its filename, then buffer it.
///
/// `Ok(None)` means the field was absent.
async fn read_field(
    mut multipart: Multipart,
    wanted: &str,
    validate: fn(Option<&str>) -> Result<&str, UploadProblem>,
) -> Result<Option<Upload>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(wanted) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let filename = validate(field.file_name())
            .map_err(|p| ApiError::BadRequest(p.message().into()))?
            .to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        return Ok(Some(Upload {
            filename,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}
