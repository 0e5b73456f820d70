//! Error types for the edgequake-content2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Content2MdError`]: **fatal**, the extraction cannot produce a
//!   document at all (unreachable source, wrong input type, engine failure,
//!   nothing extracted). Returned as `Err(Content2MdError)` from the
//!   top-level `extract*` functions.
//!
//! * [`AssetError`]: **non-fatal**, a single asset (page image, figure,
//!   rendered document file) could not be written. Stored inside
//!   [`crate::output::RenderedDocument`] so the markdown is still delivered.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-content2md library.
#[derive(Debug, Error)]
pub enum Content2MdError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// File, URL, or browser session could not be reached.
    #[error("Source '{source_ref}' is unavailable: {reason}")]
    SourceUnavailable { source_ref: String, reason: String },

    /// The input is not a document type the selected strategy understands.
    #[error("Unsupported input '{source_ref}': {detail}")]
    UnsupportedFormat { source_ref: String, detail: String },

    /// The extraction engine returned no usable structure.
    #[error("Failed to parse '{source_ref}': {detail}")]
    ParseFailure { source_ref: String, detail: String },

    /// The source was read successfully but contained no text, tables,
    /// links, or images.
    #[error("No content extracted from '{source_ref}'")]
    EmptyExtraction { source_ref: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// An output file already exists and the collision policy is `Fail`.
    #[error("Output '{path}' already exists\nRe-run with --collision replace to overwrite.")]
    AssetCollision { path: PathBuf },

    /// Could not write the caller-chosen markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium, place the\n\
library in the working directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Content2MdError {
    /// `true` for outcomes that are reported rather than raised: the source
    /// was fine but simply had nothing in it.
    pub fn is_soft(&self) -> bool {
        matches!(self, Content2MdError::EmptyExtraction { .. })
    }

    pub(crate) fn unavailable(source_ref: impl Into<String>, reason: impl ToString) -> Self {
        Content2MdError::SourceUnavailable {
            source_ref: source_ref.into(),
            reason: reason.to_string(),
        }
    }
}

/// A non-fatal error for a single exported asset.
///
/// The orchestrator records these in
/// [`crate::output::RenderedDocument::failed_assets`] and drops the asset's
/// reference from the returned markdown.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum AssetError {
    /// The output directory could not be created.
    #[error("Output directory '{path}' unavailable: {detail}")]
    DirectoryUnavailable { path: PathBuf, detail: String },

    /// Image encoding failed before anything touched the disk.
    #[error("Encoding '{name}' failed: {detail}")]
    EncodeFailed { name: String, detail: String },

    /// The file could not be written.
    #[error("Writing '{path}' failed: {detail}")]
    WriteFailed { path: PathBuf, detail: String },
}
