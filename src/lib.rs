//! # pdf-imgsize
//!
//! HTTP API that reports the size, format and pixel layout of every image in
//! an uploaded PDF, or of a single uploaded image.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 1. Input     validate the filename, spool to a temp file
//!  ├─ 2. Render    Strategy A: rasterise pages via pdfium (spawn_blocking)
//!  ├─ 3. Embedded  Strategy B: image XObjects via lopdf, only if A found nothing
//!  └─ 4. Describe  re-encode, measure, GCD-reduce, base64
//! ```
//!
//! Single-image uploads skip straight to decode and describe.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_imgsize::{harvest_pdf, Capabilities, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::default();
//!     let caps = Capabilities::probe(&config);
//!     let bytes = std::fs::read("document.pdf")?;
//!     let output = harvest_pdf(bytes, &config, &caps).await?;
//!     for image in &output.images {
//!         println!("{} {}x{} {}", image.filename, image.width, image.height, image.aspect_ratio);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-imgsize` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` to embed the router in another service:
//! ```toml
//! pdf-imgsize = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod capabilities;
pub mod config;
pub mod error;
pub mod harvest;
pub mod output;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capabilities::{Capabilities, DependencyReport, RendererBinding};
pub use config::{EncodePolicy, ServiceConfig, ServiceConfigBuilder};
pub use error::{AnalyzeError, ExtractError, ImageError, StrategyError};
pub use harvest::{analyze_image, harvest_pdf};
pub use output::{HarvestOutput, HarvestStats, ImageRecord, Strategy};
pub use server::{router, serve, AppState};
