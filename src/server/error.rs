//! HTTP error mapping.

use crate::error::{AnalyzeError, ExtractError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors returned by the route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client mistake; 400 `{error}`.
    #[error("{0}")]
    BadRequest(String),

    /// No PDF strategy can run; 500 `{error}`.
    #[error("{0}")]
    CapabilityMissing(String),

    /// Extraction or decoding failed; 500 `{success: false, error}`.
    #[error("{context}: {detail}")]
    Processing {
        context: &'static str,
        detail: String,
    },

    /// The image decoded but could not be described; 500 `{error}`.
    #[error("Failed to analyze image")]
    AnalyzeFailed,
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::CapabilityMissing { .. } => ApiError::CapabilityMissing(e.to_string()),
            other => ApiError::Processing {
                context: "Error processing PDF",
                detail: other.to_string(),
            },
        }
    }
}

impl From<AnalyzeError> for ApiError {
    fn from(e: AnalyzeError) -> Self {
        match e {
            AnalyzeError::Describe(_) => ApiError::AnalyzeFailed,
            other => ApiError::Processing {
                context: "Error analyzing image",
                detail: other.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::Processing { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "error": message }),
            ),
            ApiError::CapabilityMissing(_) | ApiError::AnalyzeFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            }
        };

        if status.is_server_error() {
            tracing::error!("{}", message);
        }

        (status, Json(body)).into_response()
    }
}
