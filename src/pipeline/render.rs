//! Strategy A: rasterise every page to a `DynamicImage` via pdfium.
//!
//! ## Threading
//!
//! pdfium is a C++ library with thread-local state; calling it from an async
//! worker would stall the runtime for the whole render. The blocking task owns
//! the spooled temp file, so the file is removed when the task ends, even if
//! the caller already gave up on it after a timeout.
//!
//! Each page is described as soon as it is rasterised and its bitmap dropped,
//! so at most one page bitmap is alive at a time.
//!
//! ## Time budget
//!
//! A malformed document can keep pdfium busy indefinitely. The time budget
//! bounds how long a request waits before falling through to embedded-object
//! extraction.

use crate::capabilities::RendererBinding;
use crate::config::{EncodePolicy, ServiceConfig};
use crate::error::{ImageError, StrategyError};
use crate::output::ImageRecord;
use crate::pipeline::{describe, input, NamedImage};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Records produced by one rasterisation pass.
#[derive(Debug, Default)]
pub struct RenderedPages {
    /// Described pages, in page order, named `page_{N}.png`.
    pub records: Vec<ImageRecord>,
    /// Pages pdfium rasterised.
    pub rendered: usize,
    /// Pages that failed to rasterise or to be described.
    pub skipped: usize,
}

impl RenderedPages {
    /// Describe the 0-based page `index` and drop its bitmap.
    fn push_page(&mut self, index: usize, image: DynamicImage, policy: &EncodePolicy) {
        let named = NamedImage::new(page_name(index), image);
        match describe::describe(&named, policy) {
            Ok(record) => self.records.push(record),
            Err(e) => {
                debug!("Dropping '{}': {}", named.name, e);
                self.skipped += 1;
            }
        }
    }
}

/// Display name of the 0-based page `index`.
pub fn page_name(index: usize) -> String {
    format!("page_{}.png", index + 1)
}

/// Pixel scale applied to PDF points (1/72 inch) for a given DPI.
pub fn scale_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / 72.0
}

/// Rasterise and describe all pages of `pdf_bytes` under the configured time
/// budget.
pub async fn render_pages(
    pdf_bytes: &[u8],
    binding: &RendererBinding,
    config: &ServiceConfig,
) -> Result<RenderedPages, StrategyError> {
    let tmp = input::spool_pdf(pdf_bytes).map_err(StrategyError::Spool)?;
    let binding = binding.clone();
    let dpi = config.dpi;
    let max_pixels = config.max_page_pixels;
    let secs = config.render_timeout_secs;
    let policy = config.encode_policy.clone();

    let task = tokio::task::spawn_blocking(move || {
        let result = render_pages_blocking(tmp.path(), &binding, dpi, max_pixels, &policy);
        drop(tmp);
        result
    });

    match tokio::time::timeout(Duration::from_secs(secs), task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(StrategyError::TaskFailed(format!("Render task panicked: {e}"))),
        Err(_) => Err(StrategyError::Timeout { secs }),
    }
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_path: &Path,
    binding: &RendererBinding,
    dpi: u32,
    max_pixels: u32,
    policy: &EncodePolicy,
) -> Result<RenderedPages, StrategyError> {
    let pdfium = binding.bind()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| StrategyError::LoadFailed(format!("{:?}", e)))?;

    let pages = document.pages();
    info!("PDF loaded for rendering: {} pages @ {} DPI", pages.len(), dpi);

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(scale_for_dpi(dpi))
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut rendered = RenderedPages::default();

    for (idx, page) in pages.iter().enumerate() {
        let bitmap = match page.render_with_config(&render_config) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                let err = ImageError::Render {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                };
                warn!("{}", err);
                rendered.skipped += 1;
                continue;
            }
        };

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        rendered.rendered += 1;
        rendered.push_page(idx, image, policy);
    }

    Ok(rendered)
}
