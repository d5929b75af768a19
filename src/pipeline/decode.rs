//! Standalone container decoding: bytes → `DynamicImage` + detected format.
//!
//! Used for uploads on `/analyze-image` and for embedded PDF streams that
//! carry a complete image file (DCTDecode streams are plain JPEG files).

use crate::error::ImageError;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

/// Decode `bytes` as a self-describing image container.
///
/// The format is sniffed from magic bytes, never from a filename, so a
/// mislabelled upload still decodes and reports its true format.
pub fn decode_container(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), ImageError> {
    let format = image::guess_format(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    debug!(
        "Decoded {:?} container → {}x{} {:?}",
        format,
        image.width(),
        image.height(),
        image.color()
    );
    Ok((image, format))
}
