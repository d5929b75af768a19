//! Server binary for pdf-imgsize.
//!
//! Maps CLI flags onto `ServiceConfig`, probes capabilities once and serves
//! the HTTP API.

use anyhow::{Context, Result};
use clap::Parser;
use pdf_imgsize::{serve, AppState, Capabilities, ServiceConfig};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"ENDPOINTS:
  GET  /health           Liveness and dependency report
  POST /extract-images   multipart field "pdf"   → every image in the PDF
  POST /analyze-image    multipart field "image" → one image

EXAMPLES:
  # Serve on the default 0.0.0.0:5000
  pdf-imgsize

  # Use a specific pdfium build
  PDFIUM_LIB_PATH=/opt/pdfium/lib pdf-imgsize --port 8080

  # Embedded-object extraction only
  pdf-imgsize --no-render

  # Check which decoders are usable, then exit
  pdf-imgsize --check

  curl -F pdf=@report.pdf http://localhost:5000/extract-images
"#;

/// Report the size, format and mode of every image in a PDF over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-imgsize",
    version,
    about = "PDF Image Size Detector HTTP API",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "PDF_IMGSIZE_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to bind.
    #[arg(short, long, env = "PDF_IMGSIZE_PORT", default_value_t = 5000)]
    port: u16,

    /// Page rasterisation DPI (72–600).
    #[arg(long, env = "PDF_IMGSIZE_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Time budget for rasterising one PDF, in seconds.
    #[arg(long, env = "PDF_IMGSIZE_RENDER_TIMEOUT", default_value_t = 120)]
    render_timeout: u64,

    /// Largest accepted upload, in MiB.
    #[arg(long, env = "PDF_IMGSIZE_MAX_UPLOAD_MB", default_value_t = 50)]
    max_upload_mb: usize,

    /// pdfium library file, or a directory containing it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Disable page rasterisation (Strategy A).
    #[arg(long, env = "PDF_IMGSIZE_NO_RENDER")]
    no_render: bool,

    /// Disable embedded image extraction (Strategy B).
    #[arg(long, env = "PDF_IMGSIZE_NO_EMBEDDED")]
    no_embedded: bool,

    /// Print a dependency report and exit.
    #[arg(long)]
    check: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_IMGSIZE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_IMGSIZE_QUIET")]
    quiet: bool,
}

impl Cli {
    fn service_config(&self) -> Result<ServiceConfig> {
        let mut builder = ServiceConfig::builder()
            .dpi(self.dpi)
            .render_timeout_secs(self.render_timeout)
            .max_upload_bytes(self.max_upload_mb.saturating_mul(1024 * 1024))
            .enable_rendering(!self.no_render)
            .enable_embedded(!self.no_embedded);
        if let Some(path) = &self.pdfium_lib_path {
            builder = builder.pdfium_lib_path(path.clone());
        }
        builder.build().context("Invalid configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = cli.service_config()?;
    let capabilities = Capabilities::probe(&config);

    // ── Check mode ───────────────────────────────────────────────────────
    if cli.check {
        print_check(&capabilities);
        if !capabilities.can_extract_pdf() {
            std::process::exit(1);
        }
        return Ok(());
    }

    tracing::info!("Starting PDF Image Size Detector v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "DPI {} · render timeout {}s · upload limit {} MiB",
        config.dpi,
        config.render_timeout_secs,
        cli.max_upload_mb
    );

    let addr = SocketAddr::new(cli.host, cli.port);
    serve(addr, AppState::new(config, capabilities))
        .await
        .with_context(|| format!("Server on {} failed", addr))
}

fn print_check(caps: &Capabilities) {
    let mark = |ok: bool| if ok { green("✓") } else { red("✗") };

    println!("{}", bold("Dependency check"));
    println!("  {} image codec   (image)", mark(caps.image_codec));
    println!("  {} PDF parser    (lopdf)", mark(caps.pdf_parser));
    match &caps.pdf_renderer {
        Some(binding) => println!("  {} PDF renderer  (pdfium at {})", mark(true), binding.describe()),
        None => println!("  {} PDF renderer  (pdfium not found; set PDFIUM_LIB_PATH)", mark(false)),
    }

    if caps.can_extract_pdf() {
        println!("\n{}", green("PDF extraction available"));
    } else {
        println!("\n{}", red("No PDF extraction strategy available"));
    }
}
