//! Progress-callback trait for per-document and per-page events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events as
//! the pipeline walks the source directory. The CLI uses it to drive an
//! indicatif progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2png::{BatchProgressCallback, RunConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, document: &str, page_index: usize, total_pages: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{document}: page {}/{}", page_index + 1, total_pages);
//!     }
//! }
//!
//! let config = RunConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { pages: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::RunStats;
use std::sync::Arc;

/// Called by the pipeline as it processes each entry and page.
///
/// The pipeline is sequential, so events arrive in order; the `Send + Sync`
/// bound only lets a callback be shared through [`crate::RunConfig`].
/// All methods have default no-op implementations.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the source directory has been listed.
    ///
    /// # Arguments
    /// * `total_entries` — directory entries that will be examined
    fn on_run_start(&self, total_entries: usize) {
        let _ = total_entries;
    }

    /// Called after a source PDF has been opened.
    fn on_document_start(&self, document: &str, total_pages: usize) {
        let _ = (document, total_pages);
    }

    /// Called when a page image has been written.
    ///
    /// # Arguments
    /// * `page_index`  — 0-indexed page number
    /// * `total_pages` — pages in the document
    fn on_page_complete(&self, document: &str, page_index: usize, total_pages: usize) {
        let _ = (document, page_index, total_pages);
    }

    /// Called when a page was skipped.
    fn on_page_error(&self, document: &str, page_index: usize, total_pages: usize, error: &str) {
        let _ = (document, page_index, total_pages, error);
    }

    /// Called once all pages of a document have been attempted.
    ///
    /// # Arguments
    /// * `written`     — pages whose PNG reached disk
    /// * `total_pages` — pages in the document
    fn on_document_complete(&self, document: &str, written: usize, total_pages: usize) {
        let _ = (document, written, total_pages);
    }

    /// Called once after the last entry.
    fn on_run_complete(&self, stats: &RunStats) {
        let _ = stats;
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
