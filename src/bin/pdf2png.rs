//! CLI binary for edgequake-pdf2png.
//!
//! A thin shim over the library crate that maps CLI flags to `RunConfig`,
//! runs the batch and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2png::{
    run_with_pdfium, BatchProgressCallback, ProgressCallback, RunConfig, RunStats,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar per document, re-armed on every
/// `on_document_start`, with a log line per finished document.
struct CliProgressCallback {
    bar: ProgressBar,
    page_errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Listing source directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_errors: AtomicUsize::new(0),
        })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_document_start(&self, document: &str, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_style(style);
        self.bar.set_length(total_pages as u64);
        self.bar.set_position(0);
        self.bar.set_prefix("Converting");
        self.bar.set_message(document.to_string());
    }

    fn on_page_complete(&self, _document: &str, _page_index: usize, _total_pages: usize) {
        self.bar.inc(1);
    }

    fn on_page_error(&self, document: &str, page_index: usize, total_pages: usize, error: &str) {
        self.page_errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {} page {:>3}/{:<3}  {}",
            red("✗"),
            document,
            page_index,
            total_pages,
            red(error),
        ));
        self.bar.inc(1);
    }

    fn on_document_complete(&self, document: &str, written: usize, total_pages: usize) {
        let mark = if written == total_pages {
            green("✓")
        } else {
            cyan("⚠")
        };
        self.bar.println(format!(
            "  {} {:<32} {}",
            mark,
            document,
            dim(&format!("{written}/{total_pages} pages")),
        ));
    }

    fn on_run_complete(&self, stats: &RunStats) {
        self.bar.finish_and_clear();
        let errors = self.page_errors.load(Ordering::SeqCst);
        if errors > 0 {
            eprintln!(
                "{} {} of {} pages skipped",
                cyan("⚠"),
                red(&errors.to_string()),
                stats.pages_written + errors,
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every PDF in the current directory → ./output/<name.pdf>/<name>_<i>.png
  pdf2png

  # Stamp a note below the page content
  pdf2png --src_dir scans --note "DRAFT" --fontsize 100 --add_note_space

  # Also rebuild <name>_with_note.pdf from the stamped pages
  pdf2png --src_dir scans --dst_dir stamped --note "CONFIDENTIAL" --back_to_pdf

  # Machine-readable report
  pdf2png --src_dir scans --json > report.json

OUTPUT LAYOUT:
  <dst_dir>/<name.pdf>/<name>_0.png … <name>_{N-1}.png
  <dst_dir>/<name.pdf>/<name>_with_note.pdf      (--note + --back_to_pdf)

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium (file or directory)
  PDF2PNG_PASSWORD  Same as --password
  RUST_LOG          Override the log filter (e.g. RUST_LOG=debug)
"#;

/// Convert every PDF in a directory to per-page PNG images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2png",
    version,
    about = "Convert every PDF in a directory to per-page PNG images, optionally stamped with a note",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory where each found PDF file's pages will be converted to images.
    #[arg(long = "src_dir", visible_alias = "src-dir", default_value = ".")]
    src_dir: PathBuf,

    /// Output directory.
    #[arg(long = "dst_dir", visible_alias = "dst-dir", default_value = "output")]
    dst_dir: PathBuf,

    /// Note added to the bottom of each extracted image.
    #[arg(long, default_value = "")]
    note: String,

    /// Font size of the note, in points at 72 DPI.
    #[arg(
        long = "fontsize",
        visible_alias = "font-size",
        default_value_t = 150.0,
        allow_negative_numbers = true
    )]
    fontsize: f64,

    /// Add white space below the page for the note instead of overlaying it.
    #[arg(long = "add_note_space", visible_alias = "add-note-space")]
    add_note_space: bool,

    /// Convert extracted pages with a note back to PDF.
    #[arg(long = "back_to_pdf", visible_alias = "back-to-pdf")]
    back_to_pdf: bool,

    /// Rendering DPI (72–600).
    #[arg(long, default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// PDF user password tried for every document.
    #[arg(long, env = "PDF2PNG_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Show a progress bar on stderr.
    #[arg(long)]
    progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Diagnostics go to stdout. The progress bar and the JSON report take
    // over that role when enabled, so only errors are logged then.
    let show_progress = cli.progress && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || cli.json || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stdout)
        .with_target(false)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = run_with_pdfium(&config).context("Conversion failed")?;
    let stats = report.stats();

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    }

    if !cli.quiet {
        let clean = stats.pages_failed == 0 && stats.failed_documents == 0;
        eprintln!(
            "{}  {} documents  {} pages  {}ms  →  {}",
            if clean { green("✔") } else { cyan("⚠") },
            stats.processed_documents,
            stats.pages_written,
            stats.duration_ms,
            bold(&config.dst_dir.display().to_string()),
        );
        if !clean {
            eprintln!(
                "   {} documents failed  /  {} pages failed",
                red(&stats.failed_documents.to_string()),
                red(&stats.pages_failed.to_string()),
            );
        }
        if stats.pdfs_written > 0 {
            eprintln!("   {} PDFs rebuilt", dim(&stats.pdfs_written.to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `RunConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RunConfig> {
    let mut builder = RunConfig::builder()
        .src_dir(&cli.src_dir)
        .dst_dir(&cli.dst_dir)
        .note(&cli.note)
        .font_size(cli.fontsize)
        .add_note_space(cli.add_note_space)
        .back_to_pdf(cli.back_to_pdf)
        .dpi(cli.dpi);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
