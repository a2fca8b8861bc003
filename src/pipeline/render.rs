//! PDF rasterisation behind the [`PageRenderer`] seam.
//!
//! The orchestrator only needs three things from a PDF engine: open a file,
//! report its page count, render page `i` to an RGBA bitmap. Keeping that
//! behind two small traits lets tests drive the whole pipeline with
//! synthetic pages, and keeps pdfium-specific error mapping in one place.
//!
//! [`PdfiumBackend`] implements both [`PageRenderer`] and
//! [`crate::pipeline::assemble::DocumentAssembler`]: pdfium must be bound
//! once per process, and the reassembled PDFs are built with the same
//! library instance.

use crate::error::{DocumentError, PageError, Pdf2PngError};
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Opens source PDFs.
pub trait PageRenderer {
    /// Open `path`. The returned document is closed when dropped.
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn SourceDocument + 'a>, DocumentError>;
}

/// One opened source PDF.
pub trait SourceDocument {
    fn page_count(&self) -> usize;

    /// Rasterise the 0-indexed page `index`.
    fn render_page(&self, index: usize) -> Result<RgbaImage, PageError>;
}

/// pdfium-backed renderer and assembler.
pub struct PdfiumBackend {
    pub(crate) pdfium: Pdfium,
    dpi: u32,
    password: Option<String>,
}

impl PdfiumBackend {
    /// Bind pdfium and render at `dpi`.
    pub fn bind(dpi: u32, password: Option<String>) -> Result<Self, Pdf2PngError> {
        let pdfium = Pdfium::new(bind_pdfium()?);
        Ok(Self {
            pdfium,
            dpi,
            password,
        })
    }

    /// Use an already bound pdfium instance.
    pub fn with_pdfium(pdfium: Pdfium, dpi: u32, password: Option<String>) -> Self {
        Self {
            pdfium,
            dpi,
            password,
        }
    }

    pub fn pdfium(&self) -> &Pdfium {
        &self.pdfium
    }
}

/// Locate and bind the pdfium library.
///
/// Search order:
/// 1. `PDFIUM_LIB_PATH` — the library file itself or its directory
/// 2. the platform library name in the working directory
/// 3. the system library
pub fn bind_pdfium() -> Result<Box<dyn PdfiumLibraryBindings>, Pdf2PngError> {
    if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
        let path = PathBuf::from(p);
        let lib = if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(&path)
        } else {
            path
        };
        debug!("Binding pdfium from PDFIUM_LIB_PATH: {}", lib.display());
        return Pdfium::bind_to_library(&lib)
            .map_err(|e| Pdf2PngError::PdfiumBindingFailed(format!("{}: {:?}", lib.display(), e)));
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Pdf2PngError::PdfiumBindingFailed(format!("{:?}", e)))
}

impl PageRenderer for PdfiumBackend {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn SourceDocument + 'a>, DocumentError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, self.password.as_deref())
            .map_err(|e| {
                let detail = format!("{:?}", e);
                if detail.contains("Password") || detail.contains("password") {
                    DocumentError::PasswordRequired {
                        path: path.to_path_buf(),
                    }
                } else {
                    DocumentError::Open {
                        path: path.to_path_buf(),
                        detail,
                    }
                }
            })?;

        let page_count = document.pages().len() as usize;
        info!("PDF loaded: {} pages", page_count);

        Ok(Box::new(PdfiumSource {
            document,
            page_count,
            scale: self.dpi as f32 / 72.0,
        }))
    }
}

struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
    page_count: usize,
    scale: f32,
}

impl SourceDocument for PdfiumSource<'_> {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn render_page(&self, index: usize) -> Result<RgbaImage, PageError> {
        let failed = |e: PdfiumError| PageError::RenderFailed {
            page: index,
            detail: format!("{:?}", e),
        };

        let page = self.document.pages().get(index as u16).map_err(failed)?;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(self.scale);
        let bitmap = page.render_with_config(&render_config).map_err(failed)?;

        let image = bitmap.as_image().into_rgba8();
        debug!(
            "Rendered page {} → {}x{} px",
            index,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}
