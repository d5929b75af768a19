//! Image describer: `NamedImage` → [`ImageRecord`].
//!
//! The describer re-encodes the image in memory, so `file_size` and `base64`
//! always describe the same bytes. The output format follows the
//! [`EncodePolicy`]; the pixel layout is converted first when the chosen
//! encoder cannot take it as-is (JPEG has no alpha channel, GIF only takes
//! RGBA, and so on).
//!
//! ## Reported mode
//!
//! `mode` tells the caller what the source image *is*. An RGBA PNG asked to
//! stay JPEG is still an RGBA image; the conversion is an encoding detail.

use crate::config::{format_name, EncodePolicy};
use crate::error::ImageError;
use crate::output::ImageRecord;
use crate::pipeline::NamedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ColorType, DynamicImage, ImageFormat};
use std::borrow::Cow;
use std::io::Cursor;
use tracing::debug;

/// Pixel layouts an encoder accepts, and the layout anything else becomes.
#[derive(Debug, Clone, Copy)]
pub struct EncoderSupport {
    pub accepts: &'static [ColorType],
    pub convert_to: ColorType,
}

/// JPEG: no alpha, no palette, 8-bit only.
pub const JPEG_COLOR_TYPES: EncoderSupport = EncoderSupport {
    accepts: &[ColorType::L8, ColorType::Rgb8],
    convert_to: ColorType::Rgb8,
};

pub const PNG_COLOR_TYPES: EncoderSupport = EncoderSupport {
    accepts: &[
        ColorType::L8,
        ColorType::La8,
        ColorType::Rgb8,
        ColorType::Rgba8,
        ColorType::L16,
        ColorType::La16,
        ColorType::Rgb16,
        ColorType::Rgba16,
    ],
    convert_to: ColorType::Rgba8,
};

pub const GIF_COLOR_TYPES: EncoderSupport = EncoderSupport {
    accepts: &[ColorType::Rgb8, ColorType::Rgba8],
    convert_to: ColorType::Rgba8,
};

pub const BMP_COLOR_TYPES: EncoderSupport = EncoderSupport {
    accepts: &[
        ColorType::L8,
        ColorType::La8,
        ColorType::Rgb8,
        ColorType::Rgba8,
    ],
    convert_to: ColorType::Rgba8,
};

pub const TIFF_COLOR_TYPES: EncoderSupport = EncoderSupport {
    accepts: &[
        ColorType::L8,
        ColorType::Rgb8,
        ColorType::Rgba8,
        ColorType::L16,
        ColorType::Rgb16,
        ColorType::Rgba16,
    ],
    convert_to: ColorType::Rgba8,
};

/// Encoder constraints for `format`.
pub fn encoder_support(format: ImageFormat) -> EncoderSupport {
    match format {
        ImageFormat::Jpeg => JPEG_COLOR_TYPES,
        ImageFormat::Gif => GIF_COLOR_TYPES,
        ImageFormat::Bmp => BMP_COLOR_TYPES,
        ImageFormat::Tiff => TIFF_COLOR_TYPES,
        _ => PNG_COLOR_TYPES,
    }
}

/// Mode label for a decoded pixel layout.
pub fn mode_label(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;F",
        ColorType::Rgba32F => "RGBA;F",
        _ => "UNKNOWN",
    }
}

/// Greatest common divisor (Euclid).
pub fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// `"W:H"` reduced to coprime components.
pub fn aspect_ratio(width: u32, height: u32) -> Result<String, ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::ZeroDimension { width, height });
    }
    let g = gcd(width, height);
    Ok(format!("{}:{}", width / g, height / g))
}

/// Describe one image, re-encoding it per `policy`.
///
/// Returns `Err` on any failure; callers drop the image and continue.
pub fn describe(named: &NamedImage, policy: &EncodePolicy) -> Result<ImageRecord, ImageError> {
    let image = &named.image;
    let (width, height) = (image.width(), image.height());
    let aspect_ratio = aspect_ratio(width, height)?;

    let format = policy.target_format(named.source_format);
    let mode = mode_label(image.color());
    let encodable = to_encodable(image, format);

    let mut buf = Vec::new();
    encodable
        .write_to(&mut Cursor::new(&mut buf), format)
        .map_err(|source| ImageError::Encode {
            format: format_name(format),
            source,
        })?;

    let file_size = buf.len();
    let base64 = STANDARD.encode(&buf);
    debug!(
        "Described '{}' → {}x{} {} as {} ({} bytes)",
        named.name,
        width,
        height,
        mode,
        format_name(format),
        file_size
    );

    Ok(ImageRecord {
        filename: named.name.clone(),
        width,
        height,
        format: format_name(format).to_string(),
        mode: mode.to_string(),
        file_size,
        aspect_ratio,
        base64,
    })
}

/// Convert `image` to a layout the `format` encoder accepts, borrowing when
/// no conversion is needed.
fn to_encodable(image: &DynamicImage, format: ImageFormat) -> Cow<'_, DynamicImage> {
    let support = encoder_support(format);
    if support.accepts.contains(&image.color()) {
        return Cow::Borrowed(image);
    }
    let converted = match support.convert_to {
        ColorType::L8 => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => DynamicImage::ImageRgba8(image.to_rgba8()),
    };
    Cow::Owned(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, LumaA, Rgb, RgbImage, Rgba, RgbaImage};

    fn rgba(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 128])))
    }

    fn decoded_len(record: &ImageRecord) -> usize {
        STANDARD.decode(&record.base64).expect("valid base64").len()
    }

    #[test]
    fn aspect_ratio_is_reduced_and_exact() {
        let sizes = [
            (1, 1),
            (1920, 1080),
            (1080, 1920),
            (1275, 1650),
            (17, 31),
            (640, 480),
            (4096, 1),
            (u32::MAX, 3),
        ];
        for (w, h) in sizes {
            let ratio = aspect_ratio(w, h).unwrap();
            let (a, b) = ratio.split_once(':').unwrap();
            let (a, b): (u64, u64) = (a.parse().unwrap(), b.parse().unwrap());
            assert_eq!(a * h as u64, b * w as u64, "{w}x{h} → {ratio}");
            assert_eq!(gcd(a as u32, b as u32), 1, "{w}x{h} → {ratio}");
        }
        assert_eq!(aspect_ratio(1920, 1080).unwrap(), "16:9");
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let img = NamedImage::new("empty.png", DynamicImage::new_rgb8(0, 5));
        let err = describe(&img, &EncodePolicy::default()).unwrap_err();
        assert!(matches!(err, ImageError::ZeroDimension { width: 0, height: 5 }));
    }

    #[test]
    fn unknown_source_format_falls_back_to_png() {
        let img = NamedImage::new("page_1.png", rgba(4, 2));
        let record = describe(&img, &EncodePolicy::default()).unwrap();
        assert_eq!(record.format, "PNG");
        assert_eq!(record.mode, "RGBA");
        assert_eq!(record.aspect_ratio, "2:1");
    }

    #[test]
    fn unlisted_source_format_falls_back_to_png() {
        let img = NamedImage::new("photo.webp", rgba(3, 3)).with_format(Some(ImageFormat::WebP));
        let record = describe(&img, &EncodePolicy::default()).unwrap();
        assert_eq!(record.format, "PNG");
        let bytes = STANDARD.decode(&record.base64).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn alpha_image_reencodes_to_jpeg() {
        let img = NamedImage::new("logo.jpg", rgba(16, 9)).with_format(Some(ImageFormat::Jpeg));
        let record = describe(&img, &EncodePolicy::default()).expect("alpha must not break JPEG");
        assert_eq!(record.format, "JPEG");
        assert_eq!(record.mode, "RGBA");
        assert_eq!(record.aspect_ratio, "16:9");
        let bytes = STANDARD.decode(&record.base64).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn sixteen_bit_gray_alpha_reencodes_to_jpeg() {
        let buf: ImageBuffer<LumaA<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(5, 5, LumaA([30_000, 65_535]));
        let img = NamedImage::new("scan.jpg", DynamicImage::ImageLumaA16(buf))
            .with_format(Some(ImageFormat::Jpeg));
        let record = describe(&img, &EncodePolicy::default()).unwrap();
        assert_eq!(record.mode, "LA;16");
        assert_eq!(record.format, "JPEG");
    }

    #[test]
    fn every_whitelisted_format_accepts_rgba_and_sizes_match() {
        let policy = EncodePolicy::default();
        for &format in &policy.reencode_formats {
            let img = NamedImage::new("x", rgba(7, 5)).with_format(Some(format));
            let record = describe(&img, &policy)
                .unwrap_or_else(|e| panic!("{format:?} failed: {e}"));
            assert_eq!(record.format, format_name(format));
            assert_eq!(record.file_size, decoded_len(&record));
        }
    }

    #[test]
    fn rgb_gif_is_encoded_without_widening() {
        assert!(matches!(
            to_encodable(&DynamicImage::new_rgb8(2, 2), ImageFormat::Gif),
            Cow::Borrowed(_)
        ));

        let img = NamedImage::new("anim.gif", DynamicImage::new_rgb8(6, 4))
            .with_format(Some(ImageFormat::Gif));
        let record = describe(&img, &EncodePolicy::default()).unwrap();
        assert_eq!(record.format, "GIF");
        assert_eq!(record.mode, "RGB");
        assert_eq!(record.file_size, decoded_len(&record));
    }

    #[test]
    fn float_image_is_encodable_as_png() {
        let img = DynamicImage::ImageRgb32F(ImageBuffer::from_pixel(2, 2, Rgb([0.5, 0.25, 1.0])));
        let record = describe(&NamedImage::new("hdr", img), &EncodePolicy::default()).unwrap();
        assert_eq!(record.mode, "RGB;F");
        assert_eq!(record.format, "PNG");
    }

    #[test]
    fn compatible_layout_is_not_copied() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        assert!(matches!(to_encodable(&img, ImageFormat::Jpeg), Cow::Borrowed(_)));
        let img = rgba(2, 2);
        assert!(matches!(to_encodable(&img, ImageFormat::Jpeg), Cow::Owned(_)));
    }
}
