//! Pipeline stages for PDF-to-PNG batch conversion.
//!
//! Each submodule implements exactly one step. The PDF engine and the font
//! engine sit behind traits so tests can swap them without touching the
//! orchestration in [`crate::convert`].
//!
//! ## Data Flow
//!
//! ```text
//! walk ──▶ render ──▶ annotate ──▶ encode ──▶ assemble
//! (dir)    (pdfium)   (rusttype)   (png)      (pdfium)
//! ```
//!
//! 1. [`walk`]     — list the source directory, classify entries
//! 2. [`render`]   — open a PDF, rasterise one page at a time
//! 3. [`annotate`] — extend the canvas and stamp the note
//! 4. [`encode`]   — PNG-encode and write each page image
//! 5. [`assemble`] — accumulate stamped pages into a new PDF

pub mod annotate;
pub mod assemble;
pub mod encode;
pub mod render;
pub mod walk;
