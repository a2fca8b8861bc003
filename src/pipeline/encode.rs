//! Image encoding: `RgbaImage` → PNG file.
//!
//! The PNG is encoded in memory first and written in one call, so an encode
//! failure never leaves a truncated file behind.

use crate::error::PageError;
use image::RgbaImage;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Encode a page image as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} bytes png",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Encode `img` and persist it at `path`.
pub fn write_page_image(img: &RgbaImage, path: &Path, page: usize) -> Result<(), PageError> {
    let bytes = encode_png(img).map_err(|e| PageError::EncodeFailed {
        page,
        detail: e.to_string(),
    })?;
    std::fs::write(path, &bytes).map_err(|e| PageError::WriteFailed {
        page,
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}
