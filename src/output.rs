//! Result types produced by the describer and the harvester.

use serde::{Deserialize, Serialize};

/// Metadata for one image, as returned by the HTTP API.
///
/// `file_size` is the length of the *re-encoded* bytes carried in `base64`,
/// not the size of the original upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    /// Canonical codec name of the re-encoded payload ("PNG", "JPEG", …).
    pub format: String,
    /// Pixel layout as decoded ("RGB", "RGBA", "L", …).
    pub mode: String,
    pub file_size: usize,
    /// Width and height reduced by their GCD, formatted "W:H".
    pub aspect_ratio: String,
    pub base64: String,
}

/// Which extraction strategy produced the records of a harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Full-page rasterisation through pdfium.
    PageRender,
    /// Image XObjects pulled out of the object graph.
    Embedded,
}

/// Counters describing how a harvest went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestStats {
    /// Strategy whose output was returned; `None` when nothing was found.
    pub strategy: Option<Strategy>,
    /// Pages rasterised by Strategy A.
    pub pages_rendered: usize,
    /// Image XObjects discovered by Strategy B.
    pub embedded_candidates: usize,
    /// Images dropped because decoding or describing failed.
    pub skipped: usize,
    pub duration_ms: u64,
}

/// Output of [`crate::harvest::harvest_pdf`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestOutput {
    pub images: Vec<ImageRecord>,
    pub stats: HarvestStats,
}
