//! HTTP-level tests driving the router with `tower::ServiceExt::oneshot`.
//!
//! The renderer is left out of the capability set so results do not depend
//! on a pdfium library being installed; `tests/render.rs` covers rasterising.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use pdf_imgsize::{router, AppState, Capabilities, ServiceConfig};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "pdf-imgsize-test-boundary";

// ── Test helpers ─────────────────────────────────────────────────────────────

fn app() -> Router {
    router(AppState::new(ServiceConfig::default(), Capabilities::without_renderer()))
}

fn app_with(config: ServiceConfig, caps: Capabilities) -> Router {
    router(AppState::new(config, caps))
}

fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, filename, content)))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ── /health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_dependencies() {
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, json) = send(app(), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["message"], "PDF Image Size Detector API is running");
    assert_eq!(json["dependencies"]["image_codec"], true);
    assert_eq!(json["dependencies"]["pdf_parser"], true);
    assert_eq!(json["dependencies"]["pdf_renderer"], false);
}

// ── /extract-images ──────────────────────────────────────────────────────────

#[tokio::test]
async fn extract_returns_embedded_images() {
    let pdf = common::pdf(
        612,
        792,
        vec![
            vec![common::jpeg_image(64, 48)],
            vec![common::raw_image(4, 2, "DeviceGray", vec![0; 8])],
        ],
    );
    let (status, json) = send(app(), upload("/extract-images", "pdf", "doc.pdf", &pdf)).await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["success"], true);
    assert_eq!(json["total_images"], 2);
    assert_eq!(json["message"], "Successfully extracted 2 images");

    let images = json["images"].as_array().unwrap();
    let first = &images[0];
    assert!(first["filename"].as_str().unwrap().starts_with("embedded_image_1_"));
    assert_eq!(first["width"], 64);
    assert_eq!(first["height"], 48);
    assert_eq!(first["aspect_ratio"], "4:3");
    assert_eq!(first["format"], "JPEG");

    let second = &images[1];
    assert!(second["filename"].as_str().unwrap().starts_with("embedded_image_2_"));
    assert_eq!(second["mode"], "L");
    assert_eq!(second["aspect_ratio"], "2:1");
    assert_eq!(second["format"], "PNG");

    for image in images {
        let decoded = STANDARD.decode(image["base64"].as_str().unwrap()).unwrap();
        assert_eq!(image["file_size"], decoded.len());
    }
}

#[tokio::test]
async fn extract_with_no_images_is_still_success() {
    let pdf = common::blank_pdf(3, 100, 100);
    let (status, json) = send(app(), upload("/extract-images", "pdf", "blank.pdf", &pdf)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["total_images"], 0);
    assert_eq!(json["images"], Value::Array(vec![]));
}

#[tokio::test]
async fn extract_accepts_uppercase_extension() {
    let pdf = common::blank_pdf(1, 100, 100);
    let (status, _) = send(app(), upload("/extract-images", "pdf", "SCAN.PDF", &pdf)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn extract_without_pdf_field_is_rejected() {
    let (status, json) = send(app(), upload("/extract-images", "file", "doc.pdf", b"%PDF")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No PDF file provided");
}

#[tokio::test]
async fn extract_with_empty_filename_is_rejected() {
    let (status, json) = send(app(), upload("/extract-images", "pdf", "", b"%PDF")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file selected");
}

#[tokio::test]
async fn extract_with_wrong_extension_is_rejected() {
    let png = common::encode(2, 2, ImageFormat::Png);
    let (status, json) = send(app(), upload("/extract-images", "pdf", "photo.png", &png)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "File must be a PDF");
}

#[tokio::test]
async fn extract_without_any_pdf_capability_is_a_server_error() {
    let config = ServiceConfig::builder()
        .enable_rendering(false)
        .enable_embedded(false)
        .build()
        .unwrap();
    let caps = Capabilities::probe(&config);
    let pdf = common::blank_pdf(1, 100, 100);

    let (status, json) = send(app_with(config, caps), upload("/extract-images", "pdf", "doc.pdf", &pdf)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("pdf_parser"), "body: {json}");
}

#[tokio::test]
async fn extract_rejects_non_multipart_body() {
    let req = Request::builder()
        .method("POST")
        .uri("/extract-images")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, json) = send(app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn oversize_upload_is_rejected() {
    let config = ServiceConfig::builder().max_upload_bytes(1024).build().unwrap();
    let app = app_with(config, Capabilities::without_renderer());
    let big = vec![b'x'; 8 * 1024];

    let (status, json) = send(app, upload("/extract-images", "pdf", "big.pdf", &big)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

// ── /analyze-image ───────────────────────────────────────────────────────────

#[tokio::test]
async fn analyze_png() {
    let png = common::encode(1920, 1080, ImageFormat::Png);
    let (status, json) = send(app(), upload("/analyze-image", "image", "wide.png", &png)).await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["success"], true);
    let image = &json["image"];
    assert_eq!(image["filename"], "wide.png");
    assert_eq!(image["width"], 1920);
    assert_eq!(image["height"], 1080);
    assert_eq!(image["aspect_ratio"], "16:9");
    assert_eq!(image["format"], "PNG");
    assert_eq!(image["mode"], "RGB");
}

#[tokio::test]
async fn analyze_keeps_jpeg_format() {
    let jpeg = common::encode(30, 20, ImageFormat::Jpeg);
    let (status, json) = send(app(), upload("/analyze-image", "image", "p.jpg", &jpeg)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["image"]["format"], "JPEG");
    assert_eq!(json["image"]["aspect_ratio"], "3:2");
}

#[tokio::test]
async fn analyze_corrupt_upload_is_a_server_error() {
    let (status, json) = send(app(), upload("/analyze-image", "image", "x.png", b"not an image")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().starts_with("Error analyzing image: "));
    assert!(json.get("image").is_none());
}

#[tokio::test]
async fn analyze_without_image_field_is_rejected() {
    let png = common::encode(2, 2, ImageFormat::Png);
    let (status, json) = send(app(), upload("/analyze-image", "pdf", "a.png", &png)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No image file provided");
}

#[tokio::test]
async fn analyze_with_empty_filename_is_rejected() {
    let png = common::encode(2, 2, ImageFormat::Png);
    let (status, json) = send(app(), upload("/analyze-image", "image", "", &png)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file selected");
}
