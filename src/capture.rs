//! Webcam capture: one active stream per session, constraint fallback ladder.
//!
//! Device acquisition walks a ladder — highest resolution, then a relaxed
//! 1280x720 target, then whatever the backend defaults to — moving down only
//! after the previous rung's open attempt rejects. The stream is an owned
//! value, so the at-most-one-active bound falls out of ownership; dropping
//! it (or calling [`CaptureStream::close`]) releases the hardware.

use std::io::Cursor;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::{Camera, NokhwaError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::region::SourceImage;

/// Cause-specific capture failures, surfaced as blocking user messages.
/// A capture failure aborts the capture workflow only; it never transitions
/// the main workflow.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no capture device found")]
    NotFound,

    #[error("capture permission denied")]
    Denied,

    #[error("capture device is busy or could not be opened")]
    Busy,

    #[error("capture device unsupported: {0}")]
    Unsupported(String),

    #[error("capture failed: {0}")]
    Backend(String),
}

impl From<NokhwaError> for CaptureError {
    fn from(err: NokhwaError) -> Self {
        match err {
            NokhwaError::OpenDeviceError(device, reason) => {
                if reason.to_lowercase().contains("denied") {
                    Self::Denied
                } else {
                    debug!(%device, %reason, "device open failed");
                    Self::Busy
                }
            }
            NokhwaError::OpenStreamError(_) => Self::Busy,
            NokhwaError::UnsupportedOperationError(backend) => {
                Self::Unsupported(format!("{backend:?}"))
            }
            NokhwaError::NotImplementedError(what) => Self::Unsupported(what),
            other => Self::Backend(other.to_string()),
        }
    }
}

/// A live hardware video stream.
pub struct CaptureStream {
    camera: Camera,
}

impl CaptureStream {
    /// Open device `index`, walking the constraint fallback ladder.
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        let devices = nokhwa::query(ApiBackend::Auto)?;
        if devices.is_empty() {
            return Err(CaptureError::NotFound);
        }

        let index = CameraIndex::Index(index);
        let ladder = [
            RequestedFormatType::AbsoluteHighestResolution,
            RequestedFormatType::Closest(CameraFormat::new(
                Resolution::new(1280, 720),
                FrameFormat::MJPEG,
                30,
            )),
            RequestedFormatType::None,
        ];

        let mut last = CaptureError::NotFound;
        for (rung, format_type) in ladder.into_iter().enumerate() {
            let requested = RequestedFormat::new::<RgbFormat>(format_type);
            match Camera::new(index.clone(), requested) {
                Ok(mut camera) => match camera.open_stream() {
                    Ok(()) => {
                        info!(
                            name = %camera.info().human_name(),
                            format = %camera.camera_format(),
                            rung,
                            "capture stream open"
                        );
                        return Ok(Self { camera });
                    }
                    Err(err) => {
                        debug!(rung, %err, "stream open rejected, relaxing constraints");
                        last = err.into();
                    }
                },
                Err(err) => {
                    debug!(rung, %err, "constraints rejected, relaxing");
                    last = err.into();
                }
            }
        }
        Err(last)
    }

    /// Human-readable names of all visible capture devices.
    pub fn list() -> Result<Vec<String>, CaptureError> {
        let devices = nokhwa::query(ApiBackend::Auto)?;
        Ok(devices.iter().map(|d| d.human_name()).collect())
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.camera.info().human_name()
    }

    /// Grab one frame and hand it back as a PNG-encoded source image.
    pub fn snapshot(&mut self, name: &str) -> Result<SourceImage, CaptureError> {
        let frame = self.camera.frame()?;
        let decoded = frame.decode_image::<RgbFormat>()?;
        let (width, height) = (decoded.width(), decoded.height());
        debug!(width, height, "frame captured");

        // Rebuild from raw bytes; the backend's image types stay its own.
        let pixels = image::RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| CaptureError::Backend("frame buffer size mismatch".to_string()))?;
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(pixels)
            .write_to(&mut buf, image::ImageFormat::Png)
            .map_err(|e| CaptureError::Backend(format!("snapshot encode: {e}")))?;

        SourceImage::from_bytes(name, buf.into_inner())
            .map_err(|e| CaptureError::Backend(e.to_string()))
    }

    /// Release the device. Dropping the stream does the same; this exists so
    /// cancel paths read explicitly.
    pub fn close(mut self) {
        if let Err(err) = self.camera.stop_stream() {
            warn!(%err, "capture stream did not stop cleanly");
        }
    }
}
