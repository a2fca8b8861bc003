//! Note stamping: extend the canvas and draw the note near the bottom.
//!
//! Geometry, for a source page of height `h` and font size `s`:
//!
//! ```text
//! canvas height   h + trunc(s) + trunc(s / 2)     (add_note_space)
//!                 h                               (otherwise)
//! note top        y = h - trunc(s + s / 4)
//! baseline        y + trunc(s)
//! ```
//!
//! The note is positioned relative to the *source* height in both modes, so
//! without added space it overlaps the bottom of the page content.
//!
//! Text is rendered at 72 DPI, so one point is one pixel and the em square
//! of the font is exactly `s` pixels tall.

use crate::error::StampError;
use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};

/// DejaVu Sans, embedded so stamping never depends on installed fonts.
pub static EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Draws text onto a bitmap.
pub trait NoteStamper {
    /// Draw `text` in black with its top-left at `(x, y)`; the baseline sits
    /// at `y + trunc(size)`. Pixels outside `canvas` are clipped.
    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        x: i32,
        y: i32,
        text: &str,
        size: f64,
    ) -> Result<(), StampError>;
}

/// [`NoteStamper`] backed by a TrueType font, [`EMBEDDED_FONT`] by default.
#[derive(Debug, Clone, Copy)]
pub struct FontStamper {
    data: &'static [u8],
}

impl Default for FontStamper {
    fn default() -> Self {
        Self {
            data: EMBEDDED_FONT,
        }
    }
}

impl FontStamper {
    pub fn from_static(data: &'static [u8]) -> Self {
        Self { data }
    }
}

impl NoteStamper for FontStamper {
    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        x: i32,
        y: i32,
        text: &str,
        size: f64,
    ) -> Result<(), StampError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(StampError::InvalidFontSize(size));
        }
        let font = Font::try_from_bytes(self.data).ok_or(StampError::FontParse)?;

        let scale = em_scale(&font, size as f32);
        let origin = point(x as f32, y.saturating_add(size.trunc() as i32) as f32);
        let (width, height) = canvas.dimensions();

        for glyph in font.layout(text, scale, origin) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px = bb.min.x + gx as i32;
                let py = bb.min.y + gy as i32;
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    return;
                }
                blend_black(canvas.get_pixel_mut(px as u32, py as u32), coverage);
            });
        }
        Ok(())
    }
}

/// rusttype scales by ascent-to-descent height; convert an em size to that.
fn em_scale(font: &Font<'_>, em_px: f32) -> Scale {
    let v = font.v_metrics_unscaled();
    let units_per_em = f32::from(font.units_per_em());
    Scale::uniform(em_px * (v.ascent - v.descent) / units_per_em)
}

/// Composite opaque black with `coverage` over `pixel`.
fn blend_black(pixel: &mut Rgba<u8>, coverage: f32) {
    let a = coverage.clamp(0.0, 1.0);
    let Rgba([r, g, b, alpha]) = *pixel;
    let keep = 1.0 - a;
    *pixel = Rgba([
        (r as f32 * keep).round() as u8,
        (g as f32 * keep).round() as u8,
        (b as f32 * keep).round() as u8,
        (alpha as f32 + (255.0 - alpha as f32) * a).round() as u8,
    ]);
}

/// Pixels added below the page when `add_note_space` is set.
pub fn note_margin(font_size: f64) -> u32 {
    truncate_px(font_size).saturating_add(truncate_px(font_size / 2.0))
}

/// Top of the note for a source page `source_height` pixels tall.
///
/// Saturates at the `i32` range for extreme font sizes.
pub fn note_top(source_height: u32, font_size: f64) -> i32 {
    let rise = (font_size + font_size / 4.0).trunc() as i64;
    let top = i64::from(source_height).saturating_sub(rise);
    top.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn truncate_px(v: f64) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.trunc() as u32
    } else {
        0
    }
}

/// The canvas the note is drawn on: a copy of `source`, optionally extended
/// downwards by [`note_margin`] white pixels.
pub fn prepare_canvas(source: &RgbaImage, font_size: f64, add_note_space: bool) -> RgbaImage {
    if !add_note_space {
        return source.clone();
    }
    let (width, height) = source.dimensions();
    let mut canvas = RgbaImage::from_pixel(
        width,
        height.saturating_add(note_margin(font_size)),
        WHITE,
    );
    image::imageops::replace(&mut canvas, source, 0, 0);
    canvas
}

/// Produce the stamped version of `source`.
///
/// On `Err` the caller should write `source` unchanged.
pub fn annotate_page(
    source: &RgbaImage,
    note: &str,
    font_size: f64,
    add_note_space: bool,
    stamper: &dyn NoteStamper,
) -> Result<RgbaImage, StampError> {
    let mut canvas = prepare_canvas(source, font_size, add_note_space);
    let y = note_top(source.height(), font_size);
    stamper.draw_text(&mut canvas, 0, y, note, font_size)?;
    Ok(canvas)
}
