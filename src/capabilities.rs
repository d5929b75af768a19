//! Capability descriptor: which decoders this process can actually use.
//!
//! Computed once at startup by [`Capabilities::probe`] and shared read-only
//! with every request. The image codec and the lopdf parser are compiled in;
//! pdfium is a shared library bound at runtime, so its presence is only known
//! after trying to bind it.
//!
//! ## Library lookup order
//!
//! 1. `ServiceConfig::pdfium_lib_path` (a library file, or a directory that
//!    contains the platform library name)
//! 2. the platform library name in the current working directory
//! 3. the system library search path

use crate::config::ServiceConfig;
use crate::error::StrategyError;
use pdfium_render::prelude::Pdfium;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where pdfium was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererBinding {
    /// An explicit library file.
    Library(PathBuf),
    /// Whatever the dynamic loader finds on the system search path.
    System,
}

impl RendererBinding {
    /// Bind to pdfium. Called per document on a blocking thread.
    pub fn bind(&self) -> Result<Pdfium, StrategyError> {
        let bindings = match self {
            RendererBinding::Library(path) => Pdfium::bind_to_library(path),
            RendererBinding::System => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| StrategyError::RendererUnavailable(format!("{e:?}")))?;
        Ok(Pdfium::new(bindings))
    }

    /// Human-readable location, for logs and the dependency report.
    pub fn describe(&self) -> String {
        match self {
            RendererBinding::Library(path) => path.display().to_string(),
            RendererBinding::System => "system library path".to_string(),
        }
    }
}

/// Immutable snapshot of available capabilities.
#[derive(Debug, Clone)]
pub struct Capabilities {
    /// Raster decode/encode (`image` crate). Always compiled in.
    pub image_codec: bool,
    /// PDF object-graph parsing (lopdf) for embedded image extraction.
    pub pdf_parser: bool,
    /// Page rasterisation through pdfium, when a library could be bound.
    pub pdf_renderer: Option<RendererBinding>,
}

/// Availability flags as reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub image_codec: bool,
    pub pdf_parser: bool,
    pub pdf_renderer: bool,
}

impl Capabilities {
    /// Probe the environment according to `config`.
    pub fn probe(config: &ServiceConfig) -> Self {
        let pdf_renderer = if config.enable_rendering {
            probe_renderer(config.pdfium_lib_path.as_deref())
        } else {
            info!("Page rendering disabled by configuration");
            None
        };

        let caps = Self {
            image_codec: true,
            pdf_parser: config.enable_embedded,
            pdf_renderer,
        };
        caps.log_summary();
        caps
    }

    /// Capabilities with no renderer, regardless of environment.
    ///
    /// Useful where pdfium must not be touched (tests, `--no-render`).
    pub fn without_renderer() -> Self {
        Self {
            image_codec: true,
            pdf_parser: true,
            pdf_renderer: None,
        }
    }

    /// True when at least one PDF strategy can run.
    pub fn can_extract_pdf(&self) -> bool {
        self.image_codec && (self.pdf_parser || self.pdf_renderer.is_some())
    }

    /// Names of the capabilities that are absent.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.image_codec {
            missing.push("image_codec");
        }
        if !self.pdf_parser {
            missing.push("pdf_parser");
        }
        if self.pdf_renderer.is_none() {
            missing.push("pdf_renderer");
        }
        missing
    }

    pub fn report(&self) -> DependencyReport {
        DependencyReport {
            image_codec: self.image_codec,
            pdf_parser: self.pdf_parser,
            pdf_renderer: self.pdf_renderer.is_some(),
        }
    }

    fn log_summary(&self) {
        match &self.pdf_renderer {
            Some(binding) => info!("PDF renderer: pdfium ({})", binding.describe()),
            None => warn!("PDF renderer unavailable; page rasterisation disabled"),
        }
        if self.pdf_parser {
            info!("PDF parser: lopdf (embedded image extraction enabled)");
        } else {
            warn!("PDF parser disabled; embedded image extraction unavailable");
        }
        if !self.can_extract_pdf() {
            warn!("No PDF strategy available; /extract-images will refuse requests");
        }
    }
}

/// Resolve a configured path: directories get the platform library name.
pub fn resolve_library_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

fn probe_renderer(explicit: Option<&Path>) -> Option<RendererBinding> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
        candidates.push(RendererBinding::Library(resolve_library_path(path)));
    }
    let local = Pdfium::pdfium_platform_library_name_at_path(Path::new("./"));
    if local.exists() {
        candidates.push(RendererBinding::Library(local));
    }
    candidates.push(RendererBinding::System);

    for candidate in candidates {
        match candidate.bind() {
            Ok(_) => return Some(candidate),
            Err(e) => debug!("pdfium not bound from {}: {}", candidate.describe(), e),
        }
    }
    None
}
