//! Pipeline integration tests with a synthetic PDF engine.
//!
//! `FakeRenderer` treats every "PDF" as a text file listing one page per
//! line: `WxH` renders a `W × H` gradient, `fail` makes that page's render
//! fail, and a file starting with `corrupt` cannot be opened at all.
//! `FakeAssembler` writes one `page WxH` line per appended page, so tests can
//! read back exactly what the reassembled document contained.

use edgequake_pdf2png::{
    run, AssembleError, AssembledDocument, BatchProgressCallback, DocumentAssembler,
    DocumentError, EntryOutcome, FontStamper, NoteStamper, PageError, PageRenderer,
    Pdf2PngError, RunConfig, RunReport, SkipReason, SourceDocument, StampError,
};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

// ── Fakes ────────────────────────────────────────────────────────────────────

struct FakeRenderer;

enum FakePage {
    Size(u32, u32),
    Fail,
}

struct FakeDocument {
    pages: Vec<FakePage>,
}

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    })
}

impl PageRenderer for FakeRenderer {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn SourceDocument + 'a>, DocumentError> {
        let text = std::fs::read_to_string(path).map_err(|e| DocumentError::Open {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        if text.starts_with("corrupt") {
            return Err(DocumentError::Open {
                path: path.to_path_buf(),
                detail: "bad xref".into(),
            });
        }
        let pages = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| match l.trim().split_once('x') {
                Some((w, h)) => FakePage::Size(w.parse().unwrap(), h.parse().unwrap()),
                None => FakePage::Fail,
            })
            .collect();
        Ok(Box::new(FakeDocument { pages }))
    }
}

impl SourceDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render_page(&self, index: usize) -> Result<RgbaImage, PageError> {
        match &self.pages[index] {
            FakePage::Size(w, h) => Ok(gradient(*w, *h)),
            FakePage::Fail => Err(PageError::RenderFailed {
                page: index,
                detail: "synthetic failure".into(),
            }),
        }
    }
}

#[derive(Default)]
struct FakeAssembler {
    fail_save: bool,
    created: AtomicUsize,
}

struct FakeOutput {
    lines: Vec<String>,
    fail_save: bool,
}

impl DocumentAssembler for FakeAssembler {
    fn new_document<'a>(&'a self) -> Result<Box<dyn AssembledDocument + 'a>, AssembleError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeOutput {
            lines: Vec::new(),
            fail_save: self.fail_save,
        }))
    }
}

impl AssembledDocument for FakeOutput {
    fn append_page(&mut self, image: &RgbaImage) -> Result<(), AssembleError> {
        self.lines
            .push(format!("page {}x{}", image.width(), image.height()));
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.lines.len()
    }

    fn save(self: Box<Self>, path: &Path) -> Result<(), AssembleError> {
        if self.fail_save {
            return Err(AssembleError::Save {
                path: path.to_path_buf(),
                detail: "read-only".into(),
            });
        }
        std::fs::write(path, self.lines.join("\n")).map_err(|e| AssembleError::Save {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

struct FailingStamper;

impl NoteStamper for FailingStamper {
    fn draw_text(
        &self,
        _canvas: &mut RgbaImage,
        _x: i32,
        _y: i32,
        _text: &str,
        _size: f64,
    ) -> Result<(), StampError> {
        Err(StampError::FontParse)
    }
}

/// Collects the formatted message of every log event.
#[derive(Clone, Default)]
struct LogCollector {
    lines: Arc<Mutex<Vec<String>>>,
}

struct MessageVisitor<'a>(&'a mut String);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.push_str(&format!("{value:?}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCollector {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut line = String::new();
        event.record(&mut MessageVisitor(&mut line));
        self.lines.lock().unwrap().push(line);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

struct Workspace {
    _tmp: TempDir,
    src: PathBuf,
    dst: PathBuf,
}

fn workspace(files: &[(&str, &str)]) -> Workspace {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    let dst = tmp.path().join("output");
    std::fs::create_dir(&src).unwrap();
    for (name, content) in files {
        std::fs::write(src.join(name), content).unwrap();
    }
    Workspace {
        _tmp: tmp,
        src,
        dst,
    }
}

fn config(ws: &Workspace) -> edgequake_pdf2png::RunConfigBuilder {
    RunConfig::builder().src_dir(&ws.src).dst_dir(&ws.dst).dpi(72)
}

fn run_fake(config: &RunConfig) -> RunReport {
    run(config, &FakeRenderer, &FakeAssembler::default(), &FontStamper::default())
        .expect("run should succeed")
}

fn png(path: &Path) -> RgbaImage {
    image::open(path)
        .unwrap_or_else(|e| panic!("{}: {e}", path.display()))
        .into_rgba8()
}

fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn dark_pixels(img: &RgbaImage, rows: std::ops::Range<u32>) -> usize {
    rows.flat_map(|y| (0..img.width()).map(move |x| (x, y)))
        .filter(|&(x, y)| {
            let p = img.get_pixel(x, y);
            p[0] < 40 && p[1] < 40 && p[2] < 40
        })
        .count()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn draft_scenario_with_note_space() {
    let ws = workspace(&[("a.pdf", "400x300\n400x300\n"), ("notes.txt", "hello")]);
    let cfg = config(&ws)
        .note("DRAFT")
        .add_note_space(true)
        .font_size(100.0)
        .build()
        .unwrap();

    let report = run_fake(&cfg);

    assert!(matches!(
        report.entry("notes.txt").map(|e| &e.outcome),
        Some(EntryOutcome::Skipped {
            reason: SkipReason::NotPdf
        })
    ));
    assert_eq!(dir_listing(&ws.dst), vec!["a.pdf"]);
    assert_eq!(
        dir_listing(&ws.dst.join("a.pdf")),
        vec!["a_0.png", "a_1.png"]
    );

    for i in 0..2 {
        let img = png(&ws.dst.join("a.pdf").join(format!("a_{i}.png")));
        assert_eq!(img.dimensions(), (400, 300 + 150));
        // original content untouched above the note box (top = 300 - 125)
        assert_eq!(*img.get_pixel(10, 20), Rgba([10, 20, 128, 255]));
        assert!(dark_pixels(&img, 175..300) > 100, "note should be drawn");
        // margin stays white apart from descender-free note text
        assert_eq!(*img.get_pixel(399, 449), Rgba([255, 255, 255, 255]));
    }

    let stats = report.stats();
    assert_eq!(stats.pages_written, 2);
    assert_eq!(stats.pages_stamped, 2);
    assert_eq!(stats.pdfs_written, 0);
}

#[test]
fn no_note_writes_rendered_pages_unchanged() {
    let ws = workspace(&[("doc.pdf", "30x20\n25x40\n10x10\n")]);
    let cfg = config(&ws).build().unwrap();

    let report = run_fake(&cfg);

    let out = ws.dst.join("doc.pdf");
    assert_eq!(
        dir_listing(&out),
        vec!["doc_0.png", "doc_1.png", "doc_2.png"]
    );
    assert_eq!(png(&out.join("doc_0.png")), gradient(30, 20));
    assert_eq!(png(&out.join("doc_1.png")), gradient(25, 40));
    assert_eq!(png(&out.join("doc_2.png")), gradient(10, 10));

    let doc = report.documents().next().unwrap();
    assert!(doc.pages.iter().all(|p| !p.stamped && !p.added_to_pdf));
}

#[test]
fn note_without_space_keeps_dimensions() {
    let ws = workspace(&[("a.pdf", "300x200\n120x90\n")]);
    let cfg = config(&ws).note("DRAFT").font_size(40.0).build().unwrap();

    run_fake(&cfg);

    let first = png(&ws.dst.join("a.pdf/a_0.png"));
    assert_eq!(first.dimensions(), (300, 200));
    assert!(dark_pixels(&first, 150..200) > 50);
    assert_eq!(png(&ws.dst.join("a.pdf/a_1.png")).dimensions(), (120, 90));
}

#[test]
fn note_space_height_truncates_font_size() {
    let ws = workspace(&[("a.pdf", "50x50\n")]);
    let cfg = config(&ws)
        .note("x")
        .font_size(15.5)
        .add_note_space(true)
        .build()
        .unwrap();

    run_fake(&cfg);

    // trunc(15.5) + trunc(7.75)
    assert_eq!(png(&ws.dst.join("a.pdf/a_0.png")).dimensions(), (50, 72));
}

#[test]
fn empty_note_never_reassembles() {
    let ws = workspace(&[("a.pdf", "20x20\n")]);
    let cfg = config(&ws).back_to_pdf(true).build().unwrap();
    assert!(!cfg.back_to_pdf);

    let assembler = FakeAssembler::default();
    run(&cfg, &FakeRenderer, &assembler, &FontStamper::default()).unwrap();

    assert_eq!(assembler.created.load(Ordering::SeqCst), 0);
    assert_eq!(dir_listing(&ws.dst.join("a.pdf")), vec!["a_0.png"]);
}

#[test]
fn reassembled_pdf_holds_written_pages_only() {
    let ws = workspace(&[("book.pdf", "100x80\nfail\n60x90\n")]);
    let cfg = config(&ws)
        .note("COPY")
        .font_size(10.0)
        .add_note_space(true)
        .back_to_pdf(true)
        .build()
        .unwrap();

    let report = run_fake(&cfg);

    let out = ws.dst.join("book.pdf");
    assert_eq!(
        dir_listing(&out),
        vec!["book_0.png", "book_2.png", "book_with_note.pdf"]
    );
    let pdf = std::fs::read_to_string(out.join("book_with_note.pdf")).unwrap();
    assert_eq!(pdf.lines().collect::<Vec<_>>(), vec!["page 100x95", "page 60x105"]);

    let doc = report.documents().next().unwrap();
    assert_eq!(doc.page_count, 3);
    assert_eq!(doc.written_pages(), 2);
    assert_eq!(doc.failed_pages(), 1);
    assert!(matches!(
        doc.pages[1].error,
        Some(PageError::RenderFailed { page: 1, .. })
    ));
    assert_eq!(doc.reassembled_pdf.as_deref(), Some(out.join("book_with_note.pdf").as_path()));
}

#[test]
fn stamp_failure_falls_back_to_original_page() {
    let ws = workspace(&[("a.pdf", "40x30\n40x30\n")]);
    let cfg = config(&ws)
        .note("DRAFT")
        .add_note_space(true)
        .back_to_pdf(true)
        .build()
        .unwrap();

    let assembler = FakeAssembler::default();
    let report = run(&cfg, &FakeRenderer, &assembler, &FailingStamper).unwrap();

    let out = ws.dst.join("a.pdf");
    // unannotated, original size, and no PDF since nothing was stamped
    assert_eq!(png(&out.join("a_0.png")), gradient(40, 30));
    assert_eq!(dir_listing(&out), vec!["a_0.png", "a_1.png"]);
    assert_eq!(assembler.created.load(Ordering::SeqCst), 1);

    let doc = report.documents().next().unwrap();
    assert!(doc.pages.iter().all(|p| !p.stamped && p.stamp_error.is_some()));
    assert!(doc.reassembled_pdf.is_none());
}

#[test]
fn non_positive_font_size_leaves_pages_unannotated() {
    let ws = workspace(&[("a.pdf", "40x30\n")]);
    let cfg = config(&ws)
        .note("DRAFT")
        .font_size(-8.0)
        .add_note_space(true)
        .build()
        .unwrap();

    let report = run_fake(&cfg);

    assert_eq!(png(&ws.dst.join("a.pdf/a_0.png")), gradient(40, 30));
    let doc = report.documents().next().unwrap();
    assert!(doc.pages[0].stamp_error.is_some());
}

#[test]
fn unreadable_document_is_skipped_and_run_continues() {
    let ws = workspace(&[("a.pdf", "corrupt"), ("b.pdf", "10x10\n")]);
    let cfg = config(&ws).build().unwrap();

    let report = run_fake(&cfg);

    assert!(matches!(
        report.entry("a.pdf").map(|e| &e.outcome),
        Some(EntryOutcome::Failed { .. })
    ));
    assert!(!ws.dst.join("a.pdf").exists());
    assert!(ws.dst.join("b.pdf/b_0.png").exists());
    assert_eq!(report.stats().failed_documents, 1);
}

#[test]
fn directories_and_other_suffixes_produce_nothing() {
    let ws = workspace(&[("upper.PDF", "10x10\n"), ("readme.md", "#")]);
    std::fs::create_dir(ws.src.join("folder.pdf")).unwrap();
    std::fs::write(ws.src.join("folder.pdf").join("inner.pdf"), "10x10\n").unwrap();
    let cfg = config(&ws).build().unwrap();

    let report = run_fake(&cfg);

    assert!(dir_listing(&ws.dst).is_empty());
    assert_eq!(report.stats().skipped_entries, 3);
    assert!(matches!(
        report.entry("folder.pdf").map(|e| &e.outcome),
        Some(EntryOutcome::Skipped {
            reason: SkipReason::Directory
        })
    ));
}

#[test]
fn pdf_save_failure_is_reported_not_fatal() {
    let ws = workspace(&[("a.pdf", "20x20\n"), ("b.pdf", "20x20\n")]);
    let cfg = config(&ws)
        .note("N")
        .font_size(8.0)
        .back_to_pdf(true)
        .build()
        .unwrap();
    let assembler = FakeAssembler {
        fail_save: true,
        ..FakeAssembler::default()
    };

    let report = run(&cfg, &FakeRenderer, &assembler, &FontStamper::default()).unwrap();

    let docs: Vec<_> = report.documents().collect();
    assert_eq!(docs.len(), 2);
    for doc in docs {
        assert!(doc.reassembled_pdf.is_none());
        assert!(doc.reassembly_error.is_some());
        assert_eq!(doc.written_pages(), 1);
    }
}

#[test]
fn runs_are_byte_identical() {
    let ws = workspace(&[("a.pdf", "120x80\n90x60\n")]);
    let first = ws.dst.with_file_name("first");
    let second = ws.dst.with_file_name("second");

    for dst in [&first, &second] {
        let cfg = RunConfig::builder()
            .src_dir(&ws.src)
            .dst_dir(dst)
            .note("DRAFT")
            .font_size(20.0)
            .add_note_space(true)
            .build()
            .unwrap();
        run_fake(&cfg);
    }

    for name in ["a_0.png", "a_1.png"] {
        let a = std::fs::read(first.join("a.pdf").join(name)).unwrap();
        let b = std::fs::read(second.join("a.pdf").join(name)).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }
}

#[test]
fn uncreatable_destination_is_fatal() {
    let ws = workspace(&[("a.pdf", "10x10\n")]);
    let blocker = ws.src.join("a.pdf");
    let cfg = RunConfig::builder()
        .src_dir(&ws.src)
        .dst_dir(blocker.join("out"))
        .build()
        .unwrap();

    let err = run(&cfg, &FakeRenderer, &FakeAssembler::default(), &FontStamper::default())
        .unwrap_err();
    assert!(matches!(err, Pdf2PngError::OutputRootCreate { .. }));
}

#[test]
fn missing_source_directory_is_fatal() {
    let ws = workspace(&[]);
    let cfg = RunConfig::builder()
        .src_dir(ws.src.join("absent"))
        .dst_dir(&ws.dst)
        .build()
        .unwrap();

    let err = run(&cfg, &FakeRenderer, &FakeAssembler::default(), &FontStamper::default())
        .unwrap_err();
    assert!(matches!(err, Pdf2PngError::SourceListing { .. }));
}

#[test]
fn progress_callback_sees_every_page() {
    #[derive(Default)]
    struct Counter {
        documents: AtomicUsize,
        pages: AtomicUsize,
        errors: AtomicUsize,
        runs: AtomicUsize,
    }

    impl BatchProgressCallback for Counter {
        fn on_document_start(&self, _document: &str, _total_pages: usize) {
            self.documents.fetch_add(1, Ordering::SeqCst);
        }
        fn on_page_complete(&self, _document: &str, _page_index: usize, _total_pages: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }
        fn on_page_error(&self, _document: &str, _page_index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn on_run_complete(&self, _stats: &edgequake_pdf2png::RunStats) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    let ws = workspace(&[("a.pdf", "10x10\nfail\n"), ("b.pdf", "10x10\n"), ("c.txt", "")]);
    let counter = Arc::new(Counter::default());
    let cfg = config(&ws).progress_callback(counter.clone()).build().unwrap();

    run_fake(&cfg);

    assert_eq!(counter.documents.load(Ordering::SeqCst), 2);
    assert_eq!(counter.pages.load(Ordering::SeqCst), 2);
    assert_eq!(counter.errors.load(Ordering::SeqCst), 1);
    assert_eq!(counter.runs.load(Ordering::SeqCst), 1);
}

#[test]
fn extreme_font_sizes_fall_back_to_unannotated_pages() {
    for size in [-3.0e9, f64::NEG_INFINITY, f64::NAN] {
        let ws = workspace(&[("a.pdf", "40x30\n")]);
        let cfg = config(&ws)
            .note("DRAFT")
            .font_size(size)
            .add_note_space(true)
            .back_to_pdf(true)
            .build()
            .unwrap();

        let report = run_fake(&cfg);

        assert_eq!(png(&ws.dst.join("a.pdf/a_0.png")), gradient(40, 30));
        assert_eq!(dir_listing(&ws.dst.join("a.pdf")), vec!["a_0.png"]);
        let doc = report.documents().next().unwrap();
        assert!(doc.pages[0].stamp_error.is_some(), "size {size}");
    }
}

#[test]
fn diagnostics_name_entry_index_file_and_page() {
    let logs = LogCollector::default();
    let subscriber = tracing_subscriber::registry().with(logs.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let ws = workspace(&[("a.pdf", "10x10\nfail\n"), ("notes.txt", "")]);
    let cfg = config(&ws).note("N").font_size(-1.0).build().unwrap();
    run_fake(&cfg);

    let lines = logs.lines.lock().unwrap();
    let has = |needle: &str| lines.iter().any(|l| l.contains(needle));
    assert!(has("[0] Working with a.pdf..."), "{lines:#?}");
    assert!(has("[0] Could not add text to a.pdf, page 0"), "{lines:#?}");
    assert!(has("[0] Could not extract page as image from a.pdf, page 1"), "{lines:#?}");
    assert!(has("[1] Skipping notes.txt: not a PDF file"), "{lines:#?}");
}
