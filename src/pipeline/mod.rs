//! Pipeline stages for image extraction.
//!
//! Each submodule implements exactly one step; the [`crate::harvest`]
//! module chains them into the fallback order.
//!
//! ## Data Flow
//!
//! ```text
//!                ┌─▶ render ───┐
//! input ─▶ bytes ┤             ├─▶ describe ─▶ ImageRecord
//!                └─▶ embedded ─┘      ▲
//!                     (decode)        │
//! upload image ─────▶ decode ─────────┘
//! ```
//!
//! 1. [`input`]    validate upload names, spool PDFs to a temp file
//! 2. [`render`]   Strategy A: rasterise pages via pdfium
//! 3. [`embedded`] Strategy B: walk image XObjects via lopdf
//! 4. [`decode`]   standalone container decoding with format detection
//! 5. [`describe`] re-encode and measure one image

pub mod decode;
pub mod describe;
pub mod embedded;
pub mod input;
pub mod render;

use image::{DynamicImage, ImageFormat};

/// A decoded image waiting to be described.
#[derive(Debug, Clone)]
pub struct NamedImage {
    /// Display name used as `ImageRecord::filename`.
    pub name: String,
    pub image: DynamicImage,
    /// Container format the bytes were decoded from, if any.
    pub source_format: Option<ImageFormat>,
}

impl NamedImage {
    pub fn new(name: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            name: name.into(),
            image,
            source_format: None,
        }
    }

    pub fn with_format(mut self, format: Option<ImageFormat>) -> Self {
        self.source_format = format;
        self
    }
}
