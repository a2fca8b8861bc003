//! Source directory listing and entry classification.
//!
//! Only the immediate entries of the source directory are considered. A
//! listing that yields some entries and some read errors is still usable;
//! only a listing with nothing usable is fatal.

use crate::error::Pdf2PngError;
use crate::output::SkipReason;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Suffix a file name must carry to be treated as a PDF (case-sensitive).
pub const PDF_SUFFIX: &str = ".pdf";

/// One listed directory entry.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub path: PathBuf,
    /// File name, lossily decoded for display.
    pub name: String,
    pub is_dir: bool,
    utf8_name: bool,
}

impl SourceEntry {
    pub fn new(path: impl Into<PathBuf>, is_dir: bool) -> Self {
        let path = path.into();
        let (name, utf8_name) = match path.file_name() {
            Some(n) => match n.to_str() {
                Some(s) => (s.to_string(), true),
                None => (n.to_string_lossy().into_owned(), false),
            },
            None => (path.to_string_lossy().into_owned(), false),
        };
        Self {
            path,
            name,
            is_dir,
            utf8_name,
        }
    }
}

/// A source PDF and where its outputs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path of the source PDF.
    pub path: PathBuf,
    /// File name including `.pdf`.
    pub name: String,
    /// File name without the trailing `.pdf`.
    pub stem: String,
    /// `<dst_dir>/<name>`.
    pub output_dir: PathBuf,
}

impl Candidate {
    /// `<output_dir>/<stem>_<index>.png`
    pub fn page_image_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("{}_{}.png", self.stem, index))
    }

    /// `<output_dir>/<stem>_with_note.pdf`
    pub fn reassembled_pdf_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_with_note.pdf", self.stem))
    }
}

/// Classification of a listed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Pdf(Candidate),
    Skip(SkipReason),
}

/// Decide whether an entry is a source PDF.
pub fn classify(entry: &SourceEntry, dst_dir: &Path) -> Classified {
    if entry.is_dir {
        return Classified::Skip(SkipReason::Directory);
    }
    if !entry.utf8_name {
        return Classified::Skip(SkipReason::NonUtf8Name);
    }
    match entry.name.strip_suffix(PDF_SUFFIX) {
        Some(stem) => Classified::Pdf(Candidate {
            path: entry.path.clone(),
            name: entry.name.clone(),
            stem: stem.to_string(),
            output_dir: dst_dir.join(&entry.name),
        }),
        None => Classified::Skip(SkipReason::NotPdf),
    }
}

/// List the immediate entries of `dir`, sorted by file name.
///
/// Per-entry read errors are logged and dropped. The listing is fatal only
/// when `read_dir` itself fails or every entry failed to be read.
pub fn list_entries(dir: &Path) -> Result<Vec<SourceEntry>, Pdf2PngError> {
    let fatal = |source| Pdf2PngError::SourceListing {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    let mut first_error = None;

    for item in std::fs::read_dir(dir).map_err(fatal)? {
        let read = item.and_then(|e| e.file_type().map(|ft| (e.path(), ft.is_dir())));
        match read {
            Ok((path, is_dir)) => entries.push(SourceEntry::new(path, is_dir)),
            Err(e) => {
                warn!("Could not read source directory fully: {}", e);
                first_error.get_or_insert(e);
            }
        }
    }

    if entries.is_empty() {
        if let Some(e) = first_error {
            return Err(fatal(e));
        }
    }

    entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(entries)
}
