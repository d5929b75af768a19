//! Strategy B: pull image XObjects out of the PDF object graph via lopdf.
//!
//! Each page's `/Resources` (inherited through `/Parent` when absent) is
//! searched for `/XObject` entries. Image XObjects are materialised; Form
//! XObjects are searched recursively since scanners and layout tools often
//! wrap images in one.
//!
//! ## Two decode paths
//!
//! 1. The stream bytes (after lopdf's supported filters) are tried as a
//!    standalone image file. DCTDecode streams are plain JPEG files and
//!    decode here, as do the occasional embedded PNG or TIFF blobs.
//! 2. Otherwise the bytes are read as raw samples using the declared
//!    `/Width`, `/Height`, `/BitsPerComponent` and `/ColorSpace`.
//!
//! Objects that fail both paths are skipped; one bad object or one bad page
//! never aborts the walk.

use crate::error::{ImageError, StrategyError};
use crate::pipeline::{decode, NamedImage};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Limit on `/Parent` hops and Form XObject nesting.
const MAX_DEPTH: usize = 32;

/// Result of one embedded-object walk.
#[derive(Debug, Default)]
pub struct EmbeddedImages {
    pub images: Vec<NamedImage>,
    /// Image XObjects discovered, decodable or not.
    pub candidates: usize,
    /// Image XObjects neither decode path could read.
    pub skipped: usize,
}

/// Colour spaces the raw-sample path understands.
///
/// Anything unrecognised (Lab, Separation, DeviceN, absent) is read as one
/// 8-bit channel per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette indices into `lookup`, whose entries are in `base`.
    Indexed {
        base: Box<PdfColorSpace>,
        lookup: Vec<u8>,
    },
}

impl PdfColorSpace {
    /// Samples per pixel in the stream data.
    pub fn components(&self) -> usize {
        match self {
            PdfColorSpace::Gray | PdfColorSpace::Indexed { .. } => 1,
            PdfColorSpace::Rgb => 3,
            PdfColorSpace::Cmyk => 4,
        }
    }

    fn from_name(name: &[u8]) -> Self {
        match name {
            b"DeviceRGB" | b"RGB" | b"CalRGB" => PdfColorSpace::Rgb,
            b"DeviceCMYK" | b"CMYK" => PdfColorSpace::Cmyk,
            _ => PdfColorSpace::Gray,
        }
    }
}

/// Display name for an embedded image.
pub fn embedded_name(page: u32, id: ObjectId) -> String {
    match id {
        (num, 0) => format!("embedded_image_{}_{}.png", page, num),
        (num, gen) => format!("embedded_image_{}_{}_{}.png", page, num, gen),
    }
}

/// Walk every page of `pdf_bytes` and materialise its image XObjects.
pub fn extract_embedded(pdf_bytes: &[u8]) -> Result<EmbeddedImages, StrategyError> {
    let doc =
        Document::load_mem(pdf_bytes).map_err(|e| StrategyError::ParseFailed(e.to_string()))?;

    let pages = doc.get_pages();
    info!("PDF parsed for embedded images: {} pages", pages.len());

    let mut out = EmbeddedImages::default();

    for (page_num, page_id) in pages {
        let ids = match page_image_ids(&doc, page_id) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Skipping page {}: {}", page_num, e);
                continue;
            }
        };

        for id in ids {
            out.candidates += 1;
            match materialize(&doc, id) {
                Ok((image, format)) => {
                    debug!(
                        "Embedded image {:?} on page {} → {}x{}",
                        id,
                        page_num,
                        image.width(),
                        image.height()
                    );
                    out.images.push(
                        NamedImage::new(embedded_name(page_num, id), image).with_format(format),
                    );
                }
                Err(e) => {
                    debug!("Skipping embedded image {:?} on page {}: {}", id, page_num, e);
                    out.skipped += 1;
                }
            }
        }
    }

    Ok(out)
}

/// Image XObject ids reachable from one page, in resource order.
fn page_image_ids(doc: &Document, page_id: ObjectId) -> Result<Vec<ObjectId>, String> {
    let page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| format!("page object {:?} unreadable: {}", page_id, e))?;

    let mut ids = Vec::new();
    if let Some(resources) = page_resources(doc, page) {
        let mut seen = HashSet::new();
        collect_images(doc, resources, &mut seen, &mut ids, 0);
    }
    Ok(ids)
}

/// The page's `/Resources`, inherited from ancestors when absent.
fn page_resources<'a>(doc: &'a Document, page: &'a Dictionary) -> Option<&'a Dictionary> {
    let mut node = Some(page);
    for _ in 0..MAX_DEPTH {
        let dict = node?;
        if let Ok(resources) = dict.get(b"Resources") {
            return resolve_dict(doc, resources);
        }
        node = dict.get(b"Parent").ok().and_then(|p| resolve_dict(doc, p));
    }
    None
}

fn collect_images(
    doc: &Document,
    resources: &Dictionary,
    seen: &mut HashSet<ObjectId>,
    ids: &mut Vec<ObjectId>,
    depth: usize,
) {
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| resolve_dict(doc, x))
    else {
        return;
    };

    for (_, value) in xobjects.iter() {
        let Object::Reference(id) = value else {
            continue;
        };
        if !seen.insert(*id) {
            continue;
        }
        let Ok(stream) = doc.get_object(*id).and_then(Object::as_stream) else {
            continue;
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => ids.push(*id),
            Ok(b"Form") if depth < MAX_DEPTH => {
                if let Some(inner) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| resolve_dict(doc, r))
                {
                    collect_images(doc, inner, seen, ids, depth + 1);
                }
            }
            _ => {}
        }
    }
}

/// Decode one image XObject through the container path, then the raw path.
fn materialize(
    doc: &Document,
    id: ObjectId,
) -> Result<(DynamicImage, Option<ImageFormat>), ImageError> {
    let stream = doc
        .get_object(id)
        .and_then(Object::as_stream)
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    let dict = &stream.dict;

    // Filters lopdf cannot undo (DCT, JPX, CCITT) leave the raw bytes.
    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    match decode::decode_container(&data) {
        Ok((image, format)) => return Ok((image, Some(format))),
        Err(e) => debug!("{:?} is not a standalone container: {}", id, e),
    }

    let width = int_entry(doc, dict, b"Width")
        .ok_or_else(|| ImageError::UnsupportedLayout("missing /Width".into()))?;
    let height = int_entry(doc, dict, b"Height")
        .ok_or_else(|| ImageError::UnsupportedLayout("missing /Height".into()))?;
    let is_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
    let bpc = int_entry(doc, dict, b"BitsPerComponent").unwrap_or(if is_mask { 1 } else { 8 });
    let color_space = parse_color_space(doc, dict.get(b"ColorSpace").ok());

    let image = interpret_raw(&data, width, height, bpc, &color_space)?;
    Ok((image, None))
}

/// Read raw samples into an image.
pub fn interpret_raw(
    data: &[u8],
    width: u32,
    height: u32,
    bpc: u32,
    color_space: &PdfColorSpace,
) -> Result<DynamicImage, ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::ZeroDimension { width, height });
    }
    let (w, h) = (width as usize, height as usize);

    if bpc != 8 && color_space.components() != 1 {
        return Err(ImageError::UnsupportedLayout(format!(
            "{} bits per component with {} components",
            bpc,
            color_space.components()
        )));
    }
    if !matches!(bpc, 1 | 2 | 4 | 8) {
        return Err(ImageError::UnsupportedLayout(format!(
            "{} bits per component",
            bpc
        )));
    }

    let row_samples = w
        .checked_mul(color_space.components())
        .ok_or_else(|| oversized(width, height))?;
    let samples = unpack_samples(data, row_samples, h, bpc)?;

    let image = match color_space {
        PdfColorSpace::Gray => {
            let max = (1u32 << bpc) - 1;
            let gray = samples
                .iter()
                .map(|&v| (v as u32 * 255 / max) as u8)
                .collect();
            DynamicImage::ImageLuma8(gray_image(width, height, gray)?)
        }
        PdfColorSpace::Rgb => DynamicImage::ImageRgb8(rgb_image(width, height, samples)?),
        PdfColorSpace::Cmyk => DynamicImage::ImageRgb8(rgb_image(width, height, cmyk_to_rgb(&samples))?),
        PdfColorSpace::Indexed { base, lookup } => expand_palette(width, height, &samples, base, lookup)?,
    };
    Ok(image)
}

/// Unpack `height` rows of `row_samples` samples at `bpc` bits each.
///
/// Rows are padded to a byte boundary; trailing data beyond the last row is
/// ignored.
fn unpack_samples(
    data: &[u8],
    row_samples: usize,
    height: usize,
    bpc: u32,
) -> Result<Vec<u8>, ImageError> {
    let bpc = bpc as usize;
    let overflow = || ImageError::UnsupportedLayout("sample count overflows".into());
    let row_bytes = row_samples.checked_mul(bpc).ok_or_else(overflow)?.div_ceil(8);
    let expected = row_bytes.checked_mul(height).ok_or_else(overflow)?;
    if data.len() < expected {
        return Err(ImageError::ShortBuffer {
            expected,
            actual: data.len(),
        });
    }
    let data = &data[..expected];
    if bpc == 8 {
        return Ok(data.to_vec());
    }

    let mask = (1u8 << bpc) - 1;
    let mut out = Vec::with_capacity(row_samples * height);
    for row in data.chunks_exact(row_bytes) {
        for x in 0..row_samples {
            let bit = x * bpc;
            let shift = 8 - bpc - (bit % 8);
            out.push((row[bit / 8] >> shift) & mask);
        }
    }
    Ok(out)
}

fn oversized(width: u32, height: u32) -> ImageError {
    ImageError::UnsupportedLayout(format!("{}x{} image is too large to address", width, height))
}

fn expand_palette(
    width: u32,
    height: u32,
    indices: &[u8],
    base: &PdfColorSpace,
    lookup: &[u8],
) -> Result<DynamicImage, ImageError> {
    let stride = base.components();
    let entries = lookup.len() / stride;
    if entries == 0 || matches!(base, PdfColorSpace::Indexed { .. }) {
        return Err(ImageError::UnsupportedLayout("unusable /Indexed palette".into()));
    }

    let mut expanded = Vec::with_capacity(indices.len() * stride);
    for &i in indices {
        // Out-of-range indices clamp to the last entry.
        let i = (i as usize).min(entries - 1);
        expanded.extend_from_slice(&lookup[i * stride..(i + 1) * stride]);
    }

    Ok(match base {
        PdfColorSpace::Gray => DynamicImage::ImageLuma8(gray_image(width, height, expanded)?),
        PdfColorSpace::Cmyk => DynamicImage::ImageRgb8(rgb_image(width, height, cmyk_to_rgb(&expanded))?),
        _ => DynamicImage::ImageRgb8(rgb_image(width, height, expanded)?),
    })
}

/// Naive CMYK → RGB without a colour profile.
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    cmyk.chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - px[3] as u32;
            [
                ((255 - px[0] as u32) * k / 255) as u8,
                ((255 - px[1] as u32) * k / 255) as u8,
                ((255 - px[2] as u32) * k / 255) as u8,
            ]
        })
        .collect()
}

fn gray_image(width: u32, height: u32, data: Vec<u8>) -> Result<GrayImage, ImageError> {
    let actual = data.len();
    GrayImage::from_raw(width, height, data).ok_or(ImageError::ShortBuffer {
        expected: width as usize * height as usize,
        actual,
    })
}

fn rgb_image(width: u32, height: u32, data: Vec<u8>) -> Result<RgbImage, ImageError> {
    let actual = data.len();
    RgbImage::from_raw(width, height, data).ok_or(ImageError::ShortBuffer {
        expected: width as usize * height as usize * 3,
        actual,
    })
}

/// Interpret a `/ColorSpace` entry.
pub fn parse_color_space(doc: &Document, entry: Option<&Object>) -> PdfColorSpace {
    let Some(obj) = entry.and_then(|o| resolve(doc, o)) else {
        return PdfColorSpace::Gray;
    };

    match obj {
        Object::Name(name) => PdfColorSpace::from_name(name),
        Object::Array(items) => {
            let family = items
                .first()
                .and_then(|f| resolve(doc, f))
                .and_then(|f| f.as_name().ok());
            match family {
                Some(b"ICCBased") => {
                    let n = items
                        .get(1)
                        .and_then(|s| resolve(doc, s))
                        .and_then(|s| s.as_stream().ok())
                        .and_then(|s| int_entry(doc, &s.dict, b"N"));
                    match n {
                        Some(1) => PdfColorSpace::Gray,
                        Some(4) => PdfColorSpace::Cmyk,
                        _ => PdfColorSpace::Rgb,
                    }
                }
                Some(b"Indexed") | Some(b"I") => {
                    let base = parse_color_space(doc, items.get(1));
                    let lookup = items
                        .get(3)
                        .and_then(|l| resolve(doc, l))
                        .map(|l| match l {
                            Object::String(bytes, _) => bytes.clone(),
                            Object::Stream(s) => s
                                .decompressed_content()
                                .unwrap_or_else(|_| s.content.clone()),
                            _ => Vec::new(),
                        })
                        .unwrap_or_default();
                    PdfColorSpace::Indexed {
                        base: Box::new(base),
                        lookup,
                    }
                }
                Some(name) => PdfColorSpace::from_name(name),
                None => PdfColorSpace::Gray,
            }
        }
        _ => PdfColorSpace::Gray,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj).and_then(|o| o.as_dict().ok())
}

fn int_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
}
