//! Configuration types for the image extraction service.
//!
//! Everything a request handler needs to know about policy lives in
//! [`ServiceConfig`], built via [`ServiceConfigBuilder`]. The config is
//! immutable once built and shared between handlers behind an `Arc`.

use crate::error::ExtractError;
use image::ImageFormat;
use std::path::PathBuf;

/// Formats an image may keep when it is re-encoded.
///
/// Anything outside this list (WebP, TGA, formats the decoder could not name)
/// is re-encoded as [`FALLBACK_FORMAT`].
pub const DEFAULT_REENCODE_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
];

/// Format used when the source format is unknown or not re-encodable.
pub const FALLBACK_FORMAT: ImageFormat = ImageFormat::Png;

/// Formats the describer has an encoder for.
pub const ENCODABLE_FORMATS: &[ImageFormat] = DEFAULT_REENCODE_FORMATS;

/// Default rasterisation resolution for PDF pages.
pub const DEFAULT_DPI: u32 = 150;

/// Canonical, upper-case codec name for a format ("PNG", "JPEG", …).
pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        ImageFormat::Bmp => "BMP",
        ImageFormat::Tiff => "TIFF",
        ImageFormat::WebP => "WEBP",
        ImageFormat::Ico => "ICO",
        ImageFormat::Tga => "TGA",
        ImageFormat::Pnm => "PPM",
        _ => "UNKNOWN",
    }
}

/// Re-encoding policy applied by the image describer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodePolicy {
    /// Source formats that are kept as-is when re-encoding.
    pub reencode_formats: Vec<ImageFormat>,
    /// Format used for everything else.
    pub fallback_format: ImageFormat,
}

impl Default for EncodePolicy {
    fn default() -> Self {
        Self {
            reencode_formats: DEFAULT_REENCODE_FORMATS.to_vec(),
            fallback_format: FALLBACK_FORMAT,
        }
    }
}

impl EncodePolicy {
    /// Pick the output format for an image whose decoder reported `source`.
    pub fn target_format(&self, source: Option<ImageFormat>) -> ImageFormat {
        match source {
            Some(f) if self.reencode_formats.contains(&f) => f,
            _ => self.fallback_format,
        }
    }
}

/// Configuration for the extraction service.
///
/// # Example
/// ```rust
/// use pdf_imgsize::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .dpi(200)
///     .render_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Rasterisation DPI for Strategy A. Range: 72–600. Default: 150.
    pub dpi: u32,

    /// Longest rendered edge in pixels. Default: 10 000.
    ///
    /// Pages are scaled by `dpi / 72`; a poster-sized page would otherwise
    /// allocate hundreds of megabytes. Aspect ratio is preserved when capped.
    pub max_page_pixels: u32,

    /// Time budget for the whole rasterisation pass. Default: 120.
    ///
    /// pdfium can hang on pathological documents. When the budget expires the
    /// request falls through to embedded-object extraction.
    pub render_timeout_secs: u64,

    /// Maximum accepted request body in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// Allow Strategy A (pdfium page rendering). Default: true.
    pub enable_rendering: bool,

    /// Allow Strategy B (embedded XObject extraction). Default: true.
    pub enable_embedded: bool,

    /// Explicit pdfium library file or directory. Default: system lookup.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Re-encoding policy for the describer.
    pub encode_policy: EncodePolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            max_page_pixels: 10_000,
            render_timeout_secs: 120,
            max_upload_bytes: 50 * 1024 * 1024,
            enable_rendering: true,
            enable_embedded: true,
            pdfium_lib_path: None,
            encode_policy: EncodePolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_page_pixels(mut self, px: u32) -> Self {
        self.config.max_page_pixels = px.max(100);
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs.max(1);
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn enable_rendering(mut self, v: bool) -> Self {
        self.config.enable_rendering = v;
        self
    }

    pub fn enable_embedded(mut self, v: bool) -> Self {
        self.config.enable_embedded = v;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn reencode_formats(mut self, formats: impl IntoIterator<Item = ImageFormat>) -> Self {
        self.config.encode_policy.reencode_formats = formats.into_iter().collect();
        self
    }

    pub fn fallback_format(mut self, format: ImageFormat) -> Self {
        self.config.encode_policy.fallback_format = format;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, ExtractError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(ExtractError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        let policy = &c.encode_policy;
        if !ENCODABLE_FORMATS.contains(&policy.fallback_format) {
            return Err(ExtractError::InvalidConfig(format!(
                "Fallback format {} has no encoder",
                format_name(policy.fallback_format)
            )));
        }
        if let Some(f) = policy
            .reencode_formats
            .iter()
            .find(|f| !ENCODABLE_FORMATS.contains(f))
        {
            return Err(ExtractError::InvalidConfig(format!(
                "Re-encode format {} has no encoder",
                format_name(*f)
            )));
        }
        Ok(self.config)
    }
}
