//! Minimal raster-canvas capability.
//!
//! The compositor draws through [`RasterCanvas`] so the drawing sequence can
//! be unit-tested against a recording fake and the pixel backend stays
//! swappable. [`PixelCanvas`] is the production backend over
//! `image`/`imageproc` with `font8x8` bitmap glyphs for labels.

use std::io::Cursor;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::error::{Error, Result};

/// Color used across the canvas API.
pub type Color = Rgba<u8>;

/// Glyph cell of the label font, pixels. Labels scale in whole cells.
pub const GLYPH_SIZE: u32 = 8;

/// Drawing surface for one compose pass.
///
/// Exclusively owned for the duration of the pass; a canvas is never shared
/// between concurrent composes.
pub trait RasterCanvas {
    /// Canvas size in pixels, equal to the source image's natural size.
    fn dimensions(&self) -> (u32, u32);

    /// Fill a rectangle, alpha-blending over existing pixels. Coordinates
    /// may be negative or exceed the canvas; out-of-bounds pixels are
    /// dropped at the raster level.
    fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Color);

    /// Stroke a rectangle outline `stroke` pixels wide.
    fn stroke_rect(&mut self, x: i64, y: i64, w: u32, h: u32, stroke: u32, color: Color);

    /// Measured `(width, height)` of `label` drawn at `size` px.
    fn measure_label(&self, label: &str, size: u32) -> (u32, u32);

    /// Draw label text with its top-left corner at `(x, y)`.
    fn draw_label(&mut self, x: i64, y: i64, label: &str, size: u32, color: Color);

    /// Encode the canvas to JPEG at `quality` (1-100).
    fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>>;
}

/// Production canvas backed by an RGBA pixel buffer.
pub struct PixelCanvas {
    pixels: RgbaImage,
}

impl PixelCanvas {
    /// Build a canvas whose base layer is the decoded source image.
    #[must_use]
    pub fn over(base: RgbaImage) -> Self {
        Self { pixels: base }
    }

    /// Integer glyph scale that approximates a font size in pixels.
    fn glyph_scale(size: u32) -> u32 {
        size.div_ceil(GLYPH_SIZE).max(1)
    }
}

impl RasterCanvas for PixelCanvas {
    fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Color) {
        if w == 0 || h == 0 {
            return;
        }
        let (cw, ch) = self.pixels.dimensions();
        let x0 = x.clamp(0, i64::from(cw));
        let y0 = y.clamp(0, i64::from(ch));
        let x1 = (x + i64::from(w)).clamp(0, i64::from(cw));
        let y1 = (y + i64::from(h)).clamp(0, i64::from(ch));
        for py in y0..y1 {
            for px in x0..x1 {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let pixel = self.pixels.get_pixel_mut(px as u32, py as u32);
                blend_pixel(pixel, color);
            }
        }
    }

    fn stroke_rect(&mut self, x: i64, y: i64, w: u32, h: u32, stroke: u32, color: Color) {
        if w == 0 || h == 0 {
            return;
        }
        // Concentric hollow rects, growing inward from the box edge.
        for inset in 0..i64::from(stroke) {
            let (rx, ry) = (x + inset, y + inset);
            let rw = i64::from(w) - inset * 2;
            let rh = i64::from(h) - inset * 2;
            if rw <= 0 || rh <= 0 {
                break;
            }
            let (Ok(rx), Ok(ry)) = (i32::try_from(rx), i32::try_from(ry)) else {
                continue;
            };
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let rect = Rect::at(rx, ry).of_size(rw as u32, rh as u32);
            draw_hollow_rect_mut(&mut self.pixels, rect, color);
        }
    }

    fn measure_label(&self, label: &str, size: u32) -> (u32, u32) {
        let scale = Self::glyph_scale(size);
        let chars = u32::try_from(label.chars().count()).unwrap_or(u32::MAX);
        (chars * GLYPH_SIZE * scale, GLYPH_SIZE * scale)
    }

    fn draw_label(&mut self, x: i64, y: i64, label: &str, size: u32, color: Color) {
        let scale = i64::from(Self::glyph_scale(size));
        let (cw, ch) = self.pixels.dimensions();
        let mut cursor_x = x;

        for ch_glyph in label.chars() {
            let Some(glyph) = BASIC_FONTS.get(ch_glyph).or_else(|| BASIC_FONTS.get('?')) else {
                cursor_x += i64::from(GLYPH_SIZE) * scale;
                continue;
            };
            for (row_idx, row) in glyph.iter().enumerate() {
                for col_idx in 0..8u8 {
                    if (*row >> col_idx) & 1 == 0 {
                        continue;
                    }
                    let gx = cursor_x + i64::from(col_idx) * scale;
                    let gy = y + row_idx as i64 * scale;
                    for sy in 0..scale {
                        for sx in 0..scale {
                            let (tx, ty) = (gx + sx, gy + sy);
                            if tx >= 0 && ty >= 0 && tx < i64::from(cw) && ty < i64::from(ch) {
                                #[allow(
                                    clippy::cast_possible_truncation,
                                    clippy::cast_sign_loss
                                )]
                                let pixel = self.pixels.get_pixel_mut(tx as u32, ty as u32);
                                blend_pixel(pixel, color);
                            }
                        }
                    }
                }
            }
            cursor_x += i64::from(GLYPH_SIZE) * scale;
        }
    }

    fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        // JPEG carries no alpha channel; flatten first.
        let rgb = DynamicImage::ImageRgba8(self.pixels.clone()).to_rgb8();
        let mut buf = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        rgb.write_with_encoder(encoder).map_err(|e| Error::Render {
            reason: format!("jpeg encode: {e}"),
        })?;
        Ok(buf.into_inner())
    }
}

/// Src-over alpha blend of `src` onto `dst`, in place.
fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = f64::from(src[3]) / 255.0;
    let da = f64::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a < f64::EPSILON {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    for i in 0..3 {
        dst[i] =
            ((f64::from(src[i]) * sa + f64::from(dst[i]) * da * (1.0 - sa)) / out_a) as u8;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        dst[3] = (out_a * 255.0) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_canvas(w: u32, h: u32) -> PixelCanvas {
        PixelCanvas::over(RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn test_fill_rect_blends_alpha() {
        let mut canvas = white_canvas(10, 10);
        canvas.fill_rect(0, 0, 10, 10, Rgba([255, 0, 0, 51])); // 0.2 alpha

        let px = canvas.pixels.get_pixel(5, 5);
        assert_eq!(px[0], 255);
        assert!(px[1] < 255 && px[1] > 190, "green dimmed: {}", px[1]);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_fill_rect_clips_out_of_bounds() {
        let mut canvas = white_canvas(4, 4);
        // Entirely above the canvas, plus one spanning the corner.
        canvas.fill_rect(-10, -10, 5, 5, Rgba([0, 0, 0, 255]));
        canvas.fill_rect(2, -2, 4, 4, Rgba([0, 255, 0, 255]));

        assert_eq!(canvas.pixels.get_pixel(3, 1), &Rgba([0, 255, 0, 255]));
        assert_eq!(canvas.pixels.get_pixel(0, 3), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_stroke_rect_leaves_interior() {
        let mut canvas = white_canvas(20, 20);
        canvas.stroke_rect(2, 2, 10, 10, 2, Rgba([255, 0, 0, 255]));

        assert_eq!(canvas.pixels.get_pixel(2, 2), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.pixels.get_pixel(3, 3), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.pixels.get_pixel(7, 7), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_measure_label_scales_with_size() {
        let canvas = white_canvas(1, 1);
        // 12px -> scale 2 -> 16px cells.
        assert_eq!(canvas.measure_label("1", 12), (16, 16));
        assert_eq!(canvas.measure_label("12", 16), (32, 16));
    }

    #[test]
    fn test_draw_label_touches_pixels() {
        let mut canvas = white_canvas(32, 32);
        canvas.draw_label(0, 0, "1", 12, Rgba([0, 0, 0, 255]));

        let touched = canvas
            .pixels
            .pixels()
            .filter(|p| p[0] == 0 && p[3] == 255)
            .count();
        assert!(touched > 0, "glyph should rasterize");
    }

    #[test]
    fn test_encode_jpeg_produces_jfif() {
        let canvas = white_canvas(8, 8);
        let bytes = canvas.encode_jpeg(90).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG SOI magic");
    }
}
