//! Overlay rendering: raster canvas capability + compositor.
//!
//! - [`canvas`] - the minimal drawing surface trait and the pixel backend
//! - [`compositor`] - turns a source image and its regions into an
//!   annotated JPEG

pub mod canvas;
pub mod compositor;

pub use canvas::{Color, PixelCanvas, RasterCanvas};
pub use compositor::{compose, label_size, render_regions, OverlayStyle};
