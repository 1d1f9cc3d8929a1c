//! Core data model: recognized text regions and image artifacts.

use std::io::Cursor;
use std::path::Path;

use image::ImageReader;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Pixel-space bounding box `(x1, y1, x2, y2)` as emitted by the detection
/// marker.
///
/// Coordinate ordering is not enforced: the recognition service owns the
/// geometry, and a box with `x1 > x2` passes through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BBox {
    #[must_use]
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// `x2 - x1`, saturating when the service emitted reversed coordinates.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    /// `y2 - y1`, saturating when the service emitted reversed coordinates.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }
}

/// One recognized text span.
///
/// Position in the parsed sequence is the 1-based label index; regions carry
/// no other identity and never change after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRegion {
    pub text: String,
    pub bbox: BBox,
}

/// An encoded source image plus its probed natural dimensions.
///
/// Immutable once committed to a session; replacing it resets every derived
/// artifact (see [`crate::session::Session`]).
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub name: String,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl SourceImage {
    /// Wrap already-encoded image bytes, probing the natural dimensions from
    /// the header.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let (width, height) = ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(|e| Error::UnreadableImage(e.to_string()))?
            .into_dimensions()
            .map_err(|e| Error::UnreadableImage(e.to_string()))?;
        Ok(Self {
            name: name.into(),
            data,
            width,
            height,
        })
    }

    /// Read a source image from disk. The file name becomes the artifact
    /// name used for downloads.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().to_string());
        let data = tokio::fs::read(path).await?;
        Self::from_bytes(name, data)
    }
}

/// The rendered overlay: a quality-0.9 JPEG the same size as its source.
///
/// A one-time resource handle. At most one lives per session;
/// [`OverlayImage::into_bytes`] consumes it, and dropping it releases it.
#[derive(Debug)]
pub struct OverlayImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl OverlayImage {
    #[must_use]
    pub(crate) fn new(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the handle, yielding the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
