//! Reassembly of stamped pages into a new PDF.
//!
//! One [`AssembledDocument`] accumulates pages for one source file and is
//! saved once after the last page. Each page is sized in points to the
//! image's pixel dimensions (1 px = 1 pt) and the image covers it entirely.

use crate::error::AssembleError;
use crate::pipeline::render::PdfiumBackend;
use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Creates empty output documents.
pub trait DocumentAssembler {
    fn new_document<'a>(&'a self) -> Result<Box<dyn AssembledDocument + 'a>, AssembleError>;
}

/// An output PDF being accumulated.
pub trait AssembledDocument {
    /// Append a page showing `image` full-bleed.
    fn append_page(&mut self, image: &RgbaImage) -> Result<(), AssembleError>;

    fn page_count(&self) -> usize;

    /// Write the finished document to `path`.
    fn save(self: Box<Self>, path: &Path) -> Result<(), AssembleError>;
}

impl DocumentAssembler for PdfiumBackend {
    fn new_document<'a>(&'a self) -> Result<Box<dyn AssembledDocument + 'a>, AssembleError> {
        let document = self
            .pdfium
            .create_new_pdf()
            .map_err(|e| AssembleError::Create(format!("{:?}", e)))?;
        Ok(Box::new(PdfiumOutput { document, pages: 0 }))
    }
}

struct PdfiumOutput<'a> {
    document: PdfDocument<'a>,
    pages: usize,
}

impl AssembledDocument for PdfiumOutput<'_> {
    fn append_page(&mut self, image: &RgbaImage) -> Result<(), AssembleError> {
        let page_index = self.pages;
        let failed = |e: PdfiumError| AssembleError::AppendPage {
            page: page_index,
            detail: format!("{:?}", e),
        };

        let width = PdfPoints::new(image.width() as f32);
        let height = PdfPoints::new(image.height() as f32);
        let image = DynamicImage::ImageRgba8(image.clone());

        let mut page = self
            .document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(width, height))
            .map_err(failed)?;

        let mut image_object = PdfPageImageObject::new(&self.document, &image).map_err(failed)?;
        image_object
            .scale(width.value, height.value)
            .map_err(failed)?;

        page.objects_mut()
            .add_object(PdfPageObject::Image(image_object))
            .map_err(failed)?;

        self.pages += 1;
        debug!(
            "Appended page {} ({}x{} pt)",
            page_index, width.value, height.value
        );
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn save(self: Box<Self>, path: &Path) -> Result<(), AssembleError> {
        self.document
            .save_to_file(path)
            .map_err(|e| AssembleError::Save {
                path: path.to_path_buf(),
                detail: format!("{:?}", e),
            })
    }
}
