//! # edgequake-pdf2png
//!
//! Batch-convert a folder of PDF documents into per-page PNG images, stamp a
//! note at the bottom of every page, and optionally rebuild a PDF from the
//! stamped pages.
//!
//! ## Pipeline Overview
//!
//! ```text
//! src_dir/
//!  │
//!  ├─ 1. Walk      list entries, keep `*.pdf`, skip the rest
//!  ├─ 2. Render    rasterise each page via pdfium
//!  ├─ 3. Annotate  optional white margin + note in the embedded font
//!  ├─ 4. Encode    PNG → dst_dir/<name.pdf>/<name>_<i>.png
//!  └─ 5. Assemble  stamped pages → dst_dir/<name.pdf>/<name>_with_note.pdf
//! ```
//!
//! Everything runs sequentially. One bad page never costs the rest of its
//! document, and one bad document never costs the rest of the run; see
//! [`convert`] for the exact policy.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2png::{run_with_pdfium, RunConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::builder()
//!         .src_dir("scans")
//!         .dst_dir("output")
//!         .note("DRAFT")
//!         .add_note_space(true)
//!         .back_to_pdf(true)
//!         .build()?;
//!     let report = run_with_pdfium(&config)?;
//!     let stats = report.stats();
//!     eprintln!("{} pages written, {} failed", stats.pages_written, stats.pages_failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2png` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Swapping engines
//!
//! [`run`] takes the PDF engine, the PDF writer and the text stamper as trait
//! objects ([`PageRenderer`], [`DocumentAssembler`], [`NoteStamper`]).
//! [`run_with_pdfium`] wires in [`PdfiumBackend`] and [`FontStamper`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RunConfig, RunConfigBuilder};
pub use convert::{run, run_with_pdfium};
pub use error::{AssembleError, DocumentError, PageError, Pdf2PngError, StampError};
pub use output::{
    DocumentReport, EntryOutcome, EntryReport, PageReport, RunReport, RunStats, SkipReason,
};
pub use pipeline::annotate::{FontStamper, NoteStamper};
pub use pipeline::assemble::{AssembledDocument, DocumentAssembler};
pub use pipeline::render::{PageRenderer, PdfiumBackend, SourceDocument};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
