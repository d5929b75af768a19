//! Input handling: upload-name validation and PDF spooling.
//!
//! ## Temp files
//!
//! pdfium opens documents from a file-system path. Writing the upload to a
//! `NamedTempFile` gives each request its own uniquely named file that is
//! removed when the handle is dropped, on success, error, timeout or panic.

use std::io::Write;
use tempfile::NamedTempFile;
use tracing::debug;

/// Reasons an upload is refused before any decoding happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadProblem {
    /// Filename is empty or absent.
    NoFileSelected,
    /// `/extract-images` only accepts `.pdf` names.
    NotAPdf,
}

impl UploadProblem {
    /// Client-facing message.
    pub fn message(self) -> &'static str {
        match self {
            UploadProblem::NoFileSelected => "No file selected",
            UploadProblem::NotAPdf => "File must be a PDF",
        }
    }
}

/// Check whether `filename` ends in `.pdf`, ignoring case.
pub fn has_pdf_extension(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}

/// Validate the filename of an upload to `/extract-images`.
pub fn validate_pdf_name(filename: Option<&str>) -> Result<&str, UploadProblem> {
    let name = validate_name(filename)?;
    if !has_pdf_extension(name) {
        return Err(UploadProblem::NotAPdf);
    }
    Ok(name)
}

/// Validate the filename of any upload.
pub fn validate_name(filename: Option<&str>) -> Result<&str, UploadProblem> {
    match filename {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(UploadProblem::NoFileSelected),
    }
}

/// Write `bytes` to a fresh, uniquely named `.pdf` temp file.
///
/// The file is deleted when the returned handle is dropped.
pub fn spool_pdf(bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut tmp = tempfile::Builder::new()
        .prefix("pdf-imgsize-")
        .suffix(".pdf")
        .tempfile()?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    debug!("Spooled {} bytes to {}", bytes.len(), tmp.path().display());
    Ok(tmp)
}
