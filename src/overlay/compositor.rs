//! Overlay compositor: source image + regions → annotated JPEG.
//!
//! Draw order follows the region sequence, so later regions composite over
//! earlier ones where boxes overlap. Each region gets a translucent
//! highlight fill, a fixed border, and a 1-based index label whose
//! background sits immediately above the box's top-left corner.

use image::Rgba;
use tracing::debug;

use crate::error::{Error, Result};
use crate::overlay::canvas::{Color, PixelCanvas, RasterCanvas};
use crate::region::{BBox, OverlayImage, SourceImage, TextRegion};

/// Smallest label font size, px.
const LABEL_MIN: u32 = 12;
/// Largest label font size, px.
const LABEL_MAX: u32 = 16;

/// Visual style for overlay drawing.
#[derive(Debug, Clone)]
pub struct OverlayStyle {
    /// Translucent fill over each recognized box.
    pub highlight: Color,
    /// Border stroke color.
    pub border: Color,
    /// Border stroke width, px.
    pub border_width: u32,
    /// Opaque background behind the index label.
    pub label_background: Color,
    /// Index label text color.
    pub label_color: Color,
    /// JPEG encode quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            highlight: Rgba([255, 0, 0, 51]), // red at 0.2 alpha
            border: Rgba([255, 0, 0, 255]),
            border_width: 2,
            label_background: Rgba([255, 0, 0, 255]),
            label_color: Rgba([255, 255, 255, 255]),
            jpeg_quality: 90,
        }
    }
}

impl OverlayStyle {
    /// Override the JPEG encode quality.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Override the border stroke width.
    #[must_use]
    pub fn with_border_width(mut self, width: u32) -> Self {
        self.border_width = width;
        self
    }
}

/// Label font size for a box: a third of its height, clamped to 12-16 px.
#[must_use]
pub fn label_size(bbox: &BBox) -> u32 {
    (bbox.height() / 3).clamp(LABEL_MIN, LABEL_MAX)
}

/// Draw every region onto `canvas` in sequence order.
///
/// Pure drawing logic, portable across canvas backends. Labels are not
/// clipped or repositioned near edges; a box at the top of the image draws
/// its label background off-canvas, matching the upstream renderer.
pub fn render_regions<C: RasterCanvas>(
    canvas: &mut C,
    regions: &[TextRegion],
    style: &OverlayStyle,
) {
    for (idx, region) in regions.iter().enumerate() {
        let b = &region.bbox;
        let (x, y) = (i64::from(b.x1), i64::from(b.y1));
        let (w, h) = (b.width(), b.height());

        canvas.fill_rect(x, y, w, h, style.highlight);
        canvas.stroke_rect(x, y, w, h, style.border_width, style.border);

        let label = (idx + 1).to_string();
        let size = label_size(b);
        let (lw, lh) = canvas.measure_label(&label, size);
        let label_y = y - i64::from(lh);
        canvas.fill_rect(x, label_y, lw, lh, style.label_background);
        canvas.draw_label(x, label_y, &label, size, style.label_color);
    }
}

/// Compose an overlay image from a source and its parsed regions.
///
/// Resolves to [`Error::Render`] when the source fails to decode or the
/// canvas fails to encode — never a silent no-op. The canvas is exclusively
/// owned for the duration of the call; `compose` itself is not meant to run
/// concurrently against one session.
pub async fn compose(
    source: &SourceImage,
    regions: &[TextRegion],
    style: &OverlayStyle,
) -> Result<OverlayImage> {
    let data = source.data.clone();
    let regions = regions.to_vec();
    let style = style.clone();
    let (width, height) = (source.width, source.height);
    debug!(
        regions = regions.len(),
        width, height, "compositing overlay"
    );

    // Decode, draw and encode are CPU-bound; keep them off the async workers.
    let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        let decoded = image::load_from_memory(&data).map_err(|e| Error::Render {
            reason: format!("source decode: {e}"),
        })?;
        let mut canvas = PixelCanvas::over(decoded.to_rgba8());
        render_regions(&mut canvas, &regions, &style);
        canvas.encode_jpeg(style.jpeg_quality)
    })
    .await
    .map_err(|e| Error::Render {
        reason: format!("render task: {e}"),
    })??;

    Ok(OverlayImage::new(bytes, width, height))
}
