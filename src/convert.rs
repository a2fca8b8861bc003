//! Batch conversion entry points.
//!
//! The run is strictly sequential: one source file is opened, every page is
//! processed in increasing index order, the file is closed, then the next
//! entry is considered. Failures are handled at the smallest granularity
//! that contains them:
//!
//! | Failure | Effect |
//! |---------|--------|
//! | destination root, source listing, pdfium binding | abort the run |
//! | open PDF, create output directory | skip the file |
//! | render, encode, write PNG | skip the page |
//! | stamp note | write the unannotated page |
//! | create / extend / save rebuilt PDF | log, keep going |

use crate::config::RunConfig;
use crate::error::{DocumentError, Pdf2PngError};
use crate::output::{DocumentReport, EntryOutcome, EntryReport, PageReport, RunReport};
use crate::pipeline::annotate::{self, FontStamper, NoteStamper};
use crate::pipeline::assemble::{AssembledDocument, DocumentAssembler};
use crate::pipeline::encode;
use crate::pipeline::render::{PageRenderer, PdfiumBackend, SourceDocument};
use crate::pipeline::walk::{self, Candidate, Classified};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert every PDF in `config.src_dir` using pdfium and the embedded font.
///
/// # Errors
/// Returns `Err(Pdf2PngError)` only for fatal errors:
/// - pdfium cannot be bound
/// - the destination root cannot be created
/// - the source directory cannot be listed
pub fn run_with_pdfium(config: &RunConfig) -> Result<RunReport, Pdf2PngError> {
    let backend = PdfiumBackend::bind(config.dpi, config.password.clone())?;
    run(config, &backend, &backend, &FontStamper::default())
}

/// Convert every PDF in `config.src_dir` with the given collaborators.
///
/// Returns `Ok(RunReport)` even when files or pages failed; inspect the
/// report (or [`RunReport::stats`]) for partial failures.
pub fn run(
    config: &RunConfig,
    renderer: &dyn PageRenderer,
    assembler: &dyn DocumentAssembler,
    stamper: &dyn NoteStamper,
) -> Result<RunReport, Pdf2PngError> {
    let start = Instant::now();

    std::fs::create_dir_all(&config.dst_dir).map_err(|source| Pdf2PngError::OutputRootCreate {
        path: config.dst_dir.clone(),
        source,
    })?;

    let entries = walk::list_entries(&config.src_dir)?;
    info!(
        "Found {} entries in {}",
        entries.len(),
        config.src_dir.display()
    );
    if let Some(cb) = &config.progress_callback {
        cb.on_run_start(entries.len());
    }

    let pipeline = Pipeline {
        config,
        renderer,
        assembler,
        stamper,
    };

    let mut report = RunReport::default();
    for (count, entry) in entries.iter().enumerate() {
        let outcome = match walk::classify(entry, &config.dst_dir) {
            Classified::Skip(reason) => {
                info!("[{}] Skipping {}: {}", count, entry.name, reason);
                EntryOutcome::Skipped { reason }
            }
            Classified::Pdf(candidate) => match pipeline.process_document(count, &candidate) {
                Ok(doc) => EntryOutcome::Processed(doc),
                Err(e) => {
                    warn!("[{}] {}", count, e);
                    EntryOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            },
        };
        report.entries.push(EntryReport {
            index: count,
            name: entry.name.clone(),
            outcome,
        });
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    let stats = report.stats();
    info!(
        "Run complete: {} documents, {} pages written, {} pages failed, {}ms",
        stats.processed_documents, stats.pages_written, stats.pages_failed, stats.duration_ms
    );
    if let Some(cb) = &config.progress_callback {
        cb.on_run_complete(&stats);
    }

    Ok(report)
}

struct Pipeline<'a> {
    config: &'a RunConfig,
    renderer: &'a dyn PageRenderer,
    assembler: &'a dyn DocumentAssembler,
    stamper: &'a dyn NoteStamper,
}

impl Pipeline<'_> {
    fn process_document(
        &self,
        count: usize,
        candidate: &Candidate,
    ) -> Result<DocumentReport, DocumentError> {
        info!("[{}] Working with {}...", count, candidate.name);

        let source = self.renderer.open(&candidate.path)?;

        std::fs::create_dir_all(&candidate.output_dir).map_err(|source| {
            DocumentError::OutputDirCreate {
                path: candidate.output_dir.clone(),
                source,
            }
        })?;

        let mut rebuilt = if self.config.reassemble_pdf() {
            match self.assembler.new_document() {
                Ok(doc) => Some(doc),
                Err(e) => {
                    warn!("[{}] Could not create a new custom PDF: {}", count, e);
                    None
                }
            }
        } else {
            None
        };

        let total = source.page_count();
        if let Some(cb) = &self.config.progress_callback {
            cb.on_document_start(&candidate.name, total);
        }

        let mut pages = Vec::with_capacity(total);
        for index in 0..total {
            let page =
                self.process_page(count, candidate, source.as_ref(), index, rebuilt.as_mut());
            if let Some(cb) = &self.config.progress_callback {
                match &page.error {
                    None => cb.on_page_complete(&candidate.name, index, total),
                    Some(e) => cb.on_page_error(&candidate.name, index, total, &e.to_string()),
                }
            }
            pages.push(page);
        }

        let mut report = DocumentReport {
            source: candidate.path.clone(),
            output_dir: candidate.output_dir.clone(),
            page_count: total,
            pages,
            reassembled_pdf: None,
            reassembly_error: None,
        };

        if let Some(doc) = rebuilt {
            self.finish_pdf(count, candidate, doc, &mut report);
        }

        if let Some(cb) = &self.config.progress_callback {
            cb.on_document_complete(&candidate.name, report.written_pages(), total);
        }

        // `source` drops here, closing the PDF.
        Ok(report)
    }

    fn process_page(
        &self,
        count: usize,
        candidate: &Candidate,
        source: &dyn SourceDocument,
        index: usize,
        rebuilt: Option<&mut Box<dyn AssembledDocument + '_>>,
    ) -> PageReport {
        let name = &candidate.name;

        let rendered = match source.render_page(index) {
            Ok(img) => img,
            Err(e) => {
                warn!(
                    "[{}] Could not extract page as image from {}, page {}: {}",
                    count, name, index, e
                );
                return PageReport::failed(e);
            }
        };

        let path = candidate.page_image_path(index);
        let mut stamp_error = None;

        let stamped = if self.config.has_note() {
            match annotate::annotate_page(
                &rendered,
                &self.config.note,
                self.config.font_size,
                self.config.add_note_space,
                self.stamper,
            ) {
                Ok(canvas) => Some(canvas),
                Err(e) => {
                    warn!(
                        "[{}] Could not add text to {}, page {}: {}. Saving without additions...",
                        count, name, index, e
                    );
                    stamp_error = Some(e.to_string());
                    None
                }
            }
        } else {
            None
        };

        let image = stamped.as_ref().unwrap_or(&rendered);
        if let Err(e) = encode::write_page_image(image, &path, index) {
            warn!("[{}] Could not save {}, {}", count, name, e);
            return PageReport {
                stamp_error,
                ..PageReport::failed(e)
            };
        }
        debug!("[{}] Wrote {}", count, path.display());

        let mut added_to_pdf = false;
        if let (Some(canvas), Some(doc)) = (&stamped, rebuilt) {
            match doc.append_page(canvas) {
                Ok(()) => added_to_pdf = true,
                Err(e) => warn!(
                    "[{}] Could not add {}, page {} to the new PDF: {}",
                    count, name, index, e
                ),
            }
        }

        PageReport {
            index,
            image: Some(path),
            width: image.width(),
            height: image.height(),
            stamped: stamped.is_some(),
            stamp_error,
            added_to_pdf,
            error: None,
        }
    }

    fn finish_pdf(
        &self,
        count: usize,
        candidate: &Candidate,
        doc: Box<dyn AssembledDocument + '_>,
        report: &mut DocumentReport,
    ) {
        if doc.page_count() == 0 {
            debug!("[{}] No stamped pages for {}; no PDF written", count, candidate.name);
            return;
        }
        let path = candidate.reassembled_pdf_path();
        let pages = doc.page_count();
        match doc.save(&path) {
            Ok(()) => {
                info!("[{}] Wrote {} ({} pages)", count, path.display(), pages);
                report.reassembled_pdf = Some(path);
            }
            Err(e) => {
                warn!(
                    "[{}] Could not convert {}'s pages back to pdf with a note: {}",
                    count, candidate.name, e
                );
                report.reassembly_error = Some(e.to_string());
            }
        }
    }
}

