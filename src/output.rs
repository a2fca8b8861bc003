//! Run report: what happened to every directory entry and every page.
//!
//! The pipeline never aborts a file for one bad page, so callers need a
//! record of partial success. [`RunReport`] is that record; the CLI prints
//! it as JSON with `--json`.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Why a directory entry was not treated as a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The entry is a directory.
    Directory,
    /// The name does not end with `.pdf`.
    NotPdf,
    /// The name is not valid UTF-8.
    NonUtf8Name,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Directory => f.write_str("is a directory"),
            SkipReason::NotPdf => f.write_str("not a PDF file"),
            SkipReason::NonUtf8Name => f.write_str("file name is not valid UTF-8"),
        }
    }
}

/// Outcome of one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// 0-indexed page number.
    pub index: usize,
    /// Written PNG, `None` when the page was skipped.
    pub image: Option<PathBuf>,
    /// Pixel dimensions of the written image.
    pub width: u32,
    pub height: u32,
    /// The note was drawn on the written image.
    pub stamped: bool,
    /// Why stamping fell back to the unannotated page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamp_error: Option<String>,
    /// The page was appended to the reassembled PDF.
    pub added_to_pdf: bool,
    /// Why the page was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
}

impl PageReport {
    pub(crate) fn failed(error: PageError) -> Self {
        Self {
            index: error.page(),
            image: None,
            width: 0,
            height: 0,
            stamped: false,
            stamp_error: None,
            added_to_pdf: false,
            error: Some(error),
        }
    }

    /// The PNG reached disk.
    pub fn is_written(&self) -> bool {
        self.image.is_some()
    }
}

/// Outcome of one processed source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub page_count: usize,
    pub pages: Vec<PageReport>,
    /// Path of the saved `<name>_with_note.pdf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reassembled_pdf: Option<PathBuf>,
    /// Why the reassembled PDF could not be produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reassembly_error: Option<String>,
}

impl DocumentReport {
    pub fn written_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_written()).count()
    }

    pub fn failed_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.error.is_some()).count()
    }
}

/// What happened to one directory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    Skipped { reason: SkipReason },
    Failed { error: String },
    Processed(DocumentReport),
}

/// One directory entry in listing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryReport {
    /// Position in the sorted listing, as printed in diagnostics.
    pub index: usize,
    pub name: String,
    pub outcome: EntryOutcome,
}

/// Aggregated counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub entries: usize,
    pub skipped_entries: usize,
    pub failed_documents: usize,
    pub processed_documents: usize,
    pub pages_written: usize,
    pub pages_stamped: usize,
    pub pages_failed: usize,
    pub pdfs_written: usize,
    pub duration_ms: u64,
}

/// Full record of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub entries: Vec<EntryReport>,
    pub duration_ms: u64,
}

impl RunReport {
    /// Processed documents in listing order.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentReport> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            EntryOutcome::Processed(doc) => Some(doc),
            _ => None,
        })
    }

    /// Find the report of an entry by file name.
    pub fn entry(&self, name: &str) -> Option<&EntryReport> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats {
            entries: self.entries.len(),
            duration_ms: self.duration_ms,
            ..RunStats::default()
        };
        for entry in &self.entries {
            match &entry.outcome {
                EntryOutcome::Skipped { .. } => stats.skipped_entries += 1,
                EntryOutcome::Failed { .. } => stats.failed_documents += 1,
                EntryOutcome::Processed(doc) => {
                    stats.processed_documents += 1;
                    stats.pages_written += doc.written_pages();
                    stats.pages_failed += doc.failed_pages();
                    stats.pages_stamped += doc.pages.iter().filter(|p| p.stamped).count();
                    if doc.reassembled_pdf.is_some() {
                        stats.pdfs_written += 1;
                    }
                }
            }
        }
        stats
    }
}
