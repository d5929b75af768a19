//! Fixture builders shared by the integration tests.
//!
//! PDFs are assembled in memory with lopdf so no binary fixtures live in the
//! repository.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::io::Cursor;

/// An image XObject with raw 8-bit samples.
pub fn raw_image(width: i64, height: i64, color_space: &str, data: Vec<u8>) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8_i64,
        },
        data,
    )
}

/// An image XObject carrying a JPEG file behind DCTDecode.
pub fn jpeg_image(width: u32, height: u32) -> Stream {
    let mut stream = raw_image(width as i64, height as i64, "DeviceRGB", encode(width, height, ImageFormat::Jpeg));
    stream.dict.set("Filter", "DCTDecode");
    stream
}

/// A solid-colour image file in `format`.
pub fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([30, 90, 150])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode fixture image");
    buf
}

/// A PDF whose pages are `width` × `height` points and carry `pages[i]` as
/// image XObjects.
pub fn pdf(width: i64, height: i64, pages: Vec<Vec<Stream>>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();

    for images in pages {
        let mut xobjects = Dictionary::new();
        for (i, img) in images.into_iter().enumerate() {
            let id = doc.add_object(img);
            xobjects.set(format!("Im{i}"), Object::Reference(id));
        }
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ],
            "Resources" => dictionary! { "XObject" => xobjects },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save fixture PDF");
    buf
}

/// A PDF of `n` blank pages.
pub fn blank_pdf(n: usize, width: i64, height: i64) -> Vec<u8> {
    pdf(width, height, (0..n).map(|_| Vec::new()).collect())
}
