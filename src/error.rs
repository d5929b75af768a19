//! Error types for the pdf-imgsize library.
//!
//! Three error types reflect three distinct blast radii (plus
//! [`AnalyzeError`] for the single-image endpoint):
//!
//! * [`ExtractError`]: **fatal** for one request. Nothing can be attempted
//!   (no PDF capability at all). Returned as
//!   `Err(ExtractError)` from [`crate::harvest::harvest_pdf`].
//!
//! * [`StrategyError`]: **non-fatal**. One extraction strategy failed as a
//!   whole (renderer missing, corrupt object graph, timeout). The harvester
//!   logs it and moves on to the next strategy.
//!
//! * [`ImageError`]: **non-fatal**. A single image could not be decoded or
//!   re-encoded. It is dropped from the result set and counted in
//!   [`crate::output::HarvestStats::skipped`].

use thiserror::Error;

/// Errors that abort a whole extraction request.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Neither a renderer nor a PDF parser is available.
    #[error("No PDF processing capability available (missing: {missing})")]
    CapabilityMissing { missing: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failure of one extraction strategy for one document.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// pdfium could not be bound.
    #[error("PDF renderer unavailable: {0}")]
    RendererUnavailable(String),

    /// The upload could not be written to a temporary file.
    #[error("Failed to spool PDF for the renderer: {0}")]
    Spool(#[source] std::io::Error),

    /// pdfium refused to open the document.
    #[error("Renderer could not load the PDF: {0}")]
    LoadFailed(String),

    /// Rendering exceeded its time budget.
    #[error("Rendering timed out after {secs}s")]
    Timeout { secs: u64 },

    /// lopdf could not parse the object graph.
    #[error("PDF object graph could not be parsed: {0}")]
    ParseFailed(String),

    /// The blocking task running the strategy panicked.
    #[error("Strategy task failed: {0}")]
    TaskFailed(String),
}

/// Failure of a single-image analysis.
///
/// The API reports the decoder's detail for `Decode` and a fixed message for
/// `Describe`.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("{0}")]
    Decode(#[source] ImageError),

    #[error("Image could not be described: {0}")]
    Describe(#[source] ImageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Width or height is zero; no aspect ratio exists.
    #[error("Image has a zero dimension ({width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    /// The re-encoder rejected the pixel data.
    #[error("Failed to encode image as {format}: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    /// pdfium failed to rasterise one page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    Render { page: usize, detail: String },

    /// The bytes are not a decodable image container.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Raw pixel data uses a layout we do not interpret.
    #[error("Unsupported pixel layout: {0}")]
    UnsupportedLayout(String),

    /// Raw pixel data is shorter than the declared geometry requires.
    #[error("Pixel buffer too short: need {expected} bytes, got {actual}")]
    ShortBuffer { expected: usize, actual: usize },
}
