//! Crate-wide error taxonomy.
//!
//! Parse skips are deliberately absent: a malformed marker block is not an
//! error, it just contributes no region (see [`crate::marker`]).

use thiserror::Error;

use crate::session::{WorkflowEvent, WorkflowState};

/// Everything that can go wrong between committing a source image and
/// writing out its overlay.
#[derive(Error, Debug)]
pub enum Error {
    /// The recognition service could not be reached, or the exchange broke
    /// at the HTTP layer.
    #[error("recognition service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The recognition service answered but reported failure.
    #[error("recognition failed: {message}")]
    Service { message: String },

    /// Decoding the source, drawing, or encoding the overlay failed.
    /// Surfaced explicitly; a compose that returns no handle is never
    /// success.
    #[error("overlay rendering failed: {reason}")]
    Render { reason: String },

    /// Capture device missing, denied, busy or unsupported.
    #[cfg(feature = "capture")]
    #[error(transparent)]
    Capture(#[from] crate::capture::CaptureError),

    /// A workflow event arrived in a state that does not allow it.
    #[error("cannot {event} while {from}")]
    InvalidTransition {
        from: WorkflowState,
        event: WorkflowEvent,
    },

    #[error("no source image committed")]
    NoSource,

    #[error("no regions to draw")]
    NoRegions,

    #[error("an overlay is already live; release it first")]
    OverlayLive,

    #[error("source image could not be read: {0}")]
    UnreadableImage(String),

    #[error("service URL is invalid: {0}")]
    BadUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
