//! Error types for the edgequake-pdf2png library.
//!
//! The batch pipeline recovers from almost everything, so errors are split
//! by the granularity they abort:
//!
//! * [`Pdf2PngError`] — **Fatal**: the run cannot start or continue at all
//!   (destination root not creatable, source directory unreadable, pdfium
//!   missing). Returned as `Err` from [`crate::convert::run`].
//!
//! * [`DocumentError`] — one source file is skipped (cannot be opened, its
//!   output directory cannot be created). The run moves to the next entry.
//!
//! * [`PageError`] — one page is skipped (render or PNG write failed). The
//!   document moves to the next page. Stored in [`crate::output::PageReport`].
//!
//! * [`StampError`] — the note could not be drawn; the page is still written,
//!   unannotated.
//!
//! * [`AssembleError`] — the rebuilt PDF could not be created, extended or
//!   saved. Logged and recorded, never propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum Pdf2PngError {
    /// The destination root could not be created.
    #[error("Could not create output directory '{path}': {source}")]
    OutputRootCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source directory listing failed and produced no usable entry.
    #[error("Could not read source directory '{path}': {source}")]
    SourceListing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the working directory, install it system-wide,\n\
or set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
Pre-built libraries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// An error that skips one source document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The renderer could not open the file as a PDF.
    #[error("Could not read '{path}': {detail}")]
    Open { path: PathBuf, detail: String },

    /// The PDF is encrypted and no (or a wrong) password was given.
    #[error("'{path}' is encrypted; provide the password with --password")]
    PasswordRequired { path: PathBuf },

    /// The per-document output directory could not be created.
    #[error("Could not make extraction directory '{path}': {source}")]
    OutputDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A non-fatal error for a single page (0-indexed).
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("page {page}: could not extract page as image: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// PNG encoding failed.
    #[error("page {page}: could not encode to png format: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The encoded PNG could not be written to disk.
    #[error("page {page}: could not write image file '{path}': {detail}")]
    WriteFailed {
        page: usize,
        path: PathBuf,
        detail: String,
    },
}

impl PageError {
    /// 0-indexed page the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. }
            | PageError::EncodeFailed { page, .. }
            | PageError::WriteFailed { page, .. } => *page,
        }
    }
}

/// Drawing the note failed; the caller falls back to the unannotated page.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StampError {
    /// The font data could not be parsed.
    #[error("could not parse font data")]
    FontParse,

    /// Zero, negative or non-finite font size.
    #[error("font size {0} cannot be rendered")]
    InvalidFontSize(f64),
}

/// Building or saving the reassembled PDF failed.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// A new output document could not be created.
    #[error("could not create a new PDF document: {0}")]
    Create(String),

    /// A page could not be appended.
    #[error("could not append page {page}: {detail}")]
    AppendPage { page: usize, detail: String },

    /// The finished document could not be written.
    #[error("could not save '{path}': {detail}")]
    Save { path: PathBuf, detail: String },
}
