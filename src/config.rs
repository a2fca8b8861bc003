//! Run configuration for a batch conversion.
//!
//! Every knob lives in [`RunConfig`], built once via [`RunConfigBuilder`] and
//! then passed by reference to every pipeline stage. Nothing reads flags from
//! global state.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and keeps the
//! cross-field rule (no note ⇒ no reassembled PDF) in one place: `build()`.

use crate::error::Pdf2PngError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Default point size of the stamped note.
pub const DEFAULT_FONT_SIZE: f64 = 150.0;

/// Default rendering resolution.
pub const DEFAULT_DPI: u32 = 300;

/// Accepted rendering resolutions.
pub const DPI_RANGE: std::ops::RangeInclusive<u32> = 72..=600;

/// Configuration for one batch run.
///
/// Built via [`RunConfig::builder()`] or using [`RunConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2png::RunConfig;
///
/// let config = RunConfig::builder()
///     .src_dir("scans")
///     .dst_dir("out")
///     .note("DRAFT")
///     .font_size(100.0)
///     .add_note_space(true)
///     .build()
///     .unwrap();
/// assert!(!config.reassemble_pdf());
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Directory scanned (non-recursively) for `*.pdf` files. Default: `.`
    pub src_dir: PathBuf,

    /// Root of the generated output tree. Default: `output`
    pub dst_dir: PathBuf,

    /// Text stamped at the bottom of every page. Empty disables annotation.
    pub note: String,

    /// Point size of the note at 72 DPI (1 pt = 1 px). Default: 150.
    ///
    /// Not validated: zero or negative sizes reach the annotator, which
    /// leaves such pages unannotated.
    pub font_size: f64,

    /// Grow the canvas by `trunc(size) + trunc(size / 2)` pixels so the note
    /// sits below the page content instead of over it. Default: false.
    pub add_note_space: bool,

    /// Rebuild a `<name>_with_note.pdf` from the stamped pages. Default: false.
    ///
    /// Always false when `note` is empty.
    pub back_to_pdf: bool,

    /// Rendering resolution of source pages. Range: 72–600. Default: 300.
    pub dpi: u32,

    /// PDF user password tried for every source document.
    pub password: Option<String>,

    /// Optional progress callback for per-document and per-page events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("."),
            dst_dir: PathBuf::from("output"),
            note: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            add_note_space: false,
            back_to_pdf: false,
            dpi: DEFAULT_DPI,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("src_dir", &self.src_dir)
            .field("dst_dir", &self.dst_dir)
            .field("note", &self.note)
            .field("font_size", &self.font_size)
            .field("add_note_space", &self.add_note_space)
            .field("back_to_pdf", &self.back_to_pdf)
            .field("dpi", &self.dpi)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether pages get a note stamped on them.
    pub fn has_note(&self) -> bool {
        !self.note.is_empty()
    }

    /// Whether a reassembled PDF is produced per source document.
    pub fn reassemble_pdf(&self) -> bool {
        self.back_to_pdf && self.has_note()
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn src_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.src_dir = dir.into();
        self
    }

    pub fn dst_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.dst_dir = dir.into();
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.config.note = note.into();
        self
    }

    pub fn font_size(mut self, size: f64) -> Self {
        self.config.font_size = size;
        self
    }

    pub fn add_note_space(mut self, v: bool) -> Self {
        self.config.add_note_space = v;
        self
    }

    pub fn back_to_pdf(mut self, v: bool) -> Self {
        self.config.back_to_pdf = v;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// An empty note switches `back_to_pdf` off: without a note there is
    /// nothing new to put back into a PDF.
    pub fn build(mut self) -> Result<RunConfig, Pdf2PngError> {
        if !DPI_RANGE.contains(&self.config.dpi) {
            return Err(Pdf2PngError::InvalidConfig(format!(
                "DPI must be {}–{}, got {}",
                DPI_RANGE.start(),
                DPI_RANGE.end(),
                self.config.dpi
            )));
        }
        if self.config.back_to_pdf && !self.config.has_note() {
            info!("No note was specified. No need to convert back to PDF");
            self.config.back_to_pdf = false;
        }
        Ok(self.config)
    }
}
