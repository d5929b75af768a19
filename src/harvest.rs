//! Extraction entry points: the PDF harvester and the single-image analyser.
//!
//! ## Strategy order
//!
//! Page rasterisation runs first and captures everything visible on a page,
//! vector art included. Embedded-object extraction only runs when
//! rasterisation produced no records at all; a response never mixes whole
//! pages with the images drawn on them.

use crate::capabilities::Capabilities;
use crate::config::{EncodePolicy, ServiceConfig};
use crate::error::{AnalyzeError, ExtractError, StrategyError};
use crate::output::{HarvestOutput, HarvestStats, ImageRecord, Strategy};
use crate::pipeline::{decode, describe, embedded, render, NamedImage};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract and describe every image in a PDF.
///
/// # Returns
/// `Ok(HarvestOutput)` whenever at least one strategy could be attempted,
/// including the case where nothing was found (`images` is empty).
///
/// # Errors
/// Returns `Err(ExtractError)` only when no PDF capability is available.
pub async fn harvest_pdf(
    pdf_bytes: Vec<u8>,
    config: &ServiceConfig,
    capabilities: &Capabilities,
) -> Result<HarvestOutput, ExtractError> {
    let start = Instant::now();

    if !capabilities.can_extract_pdf() {
        return Err(ExtractError::CapabilityMissing {
            missing: capabilities.missing().join(", "),
        });
    }

    let pdf: Arc<[u8]> = pdf_bytes.into();
    info!("Harvesting images from {} byte PDF", pdf.len());

    let mut stats = HarvestStats::default();
    let mut images = Vec::new();

    // ── Strategy A: page rasterisation ───────────────────────────────────
    if let Some(binding) = &capabilities.pdf_renderer {
        match render::render_pages(&pdf, binding, config).await {
            Ok(rendered) => {
                stats.pages_rendered = rendered.rendered;
                stats.skipped += rendered.skipped;
                if !rendered.records.is_empty() {
                    stats.strategy = Some(Strategy::PageRender);
                    images = rendered.records;
                }
            }
            Err(e) => warn!("Page rendering produced nothing: {}", e),
        }
    }

    // ── Strategy B: embedded objects ─────────────────────────────────────
    if images.is_empty() && capabilities.pdf_parser {
        match extract_and_describe(Arc::clone(&pdf), config.encode_policy.clone()).await {
            Ok((candidates, records, skipped)) => {
                stats.embedded_candidates = candidates;
                stats.skipped += skipped;
                if !records.is_empty() {
                    stats.strategy = Some(Strategy::Embedded);
                    images = records;
                }
            }
            Err(e) => warn!("Embedded image extraction produced nothing: {}", e),
        }
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Harvest complete: {} images via {:?} ({} skipped) in {}ms",
        images.len(),
        stats.strategy,
        stats.skipped,
        stats.duration_ms
    );

    Ok(HarvestOutput { images, stats })
}

/// Decode and describe a single uploaded image.
///
/// `filename` becomes the record's `filename`.
pub async fn analyze_image(
    bytes: Vec<u8>,
    filename: String,
    policy: &EncodePolicy,
) -> Result<ImageRecord, AnalyzeError> {
    let policy = policy.clone();
    tokio::task::spawn_blocking(move || -> Result<ImageRecord, AnalyzeError> {
        let (image, format) = decode::decode_container(&bytes).map_err(AnalyzeError::Decode)?;
        let named = NamedImage::new(filename, image).with_format(Some(format));
        describe::describe(&named, &policy).map_err(AnalyzeError::Describe)
    })
    .await
    .map_err(|e| AnalyzeError::Internal(format!("Analyze task panicked: {e}")))?
}

/// Describe a batch, dropping images the describer rejects.
///
/// Returns the records and the number dropped.
fn describe_batch(images: &[NamedImage], policy: &EncodePolicy) -> (Vec<ImageRecord>, usize) {
    let mut records = Vec::with_capacity(images.len());
    let mut skipped = 0;
    for named in images {
        match describe::describe(named, policy) {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!("Dropping '{}': {}", named.name, e);
                skipped += 1;
            }
        }
    }
    (records, skipped)
}

/// Strategy B plus description on one blocking thread.
///
/// Returns `(candidates, records, skipped)`.
async fn extract_and_describe(
    pdf: Arc<[u8]>,
    policy: EncodePolicy,
) -> Result<(usize, Vec<ImageRecord>, usize), StrategyError> {
    tokio::task::spawn_blocking(move || -> Result<_, StrategyError> {
        let found = embedded::extract_embedded(&pdf)?;
        let (records, dropped) = describe_batch(&found.images, &policy);
        Ok((found.candidates, records, found.skipped + dropped))
    })
    .await
    .map_err(|e| StrategyError::TaskFailed(format!("Embedded task panicked: {e}")))?
}
