//! `markbox` - DeepSeek-OCR grounding client
//!
//! Turns the marker-annotated text stream produced by a DeepSeek-OCR
//! recognition service into structured text regions, and renders those
//! regions as a bounding-box overlay on the source image for human
//! verification.
//!
//! # Features
//!
//! - **Marker parsing** - total, skip-on-malformed parser for the
//!   `<|ref|>`/`<|det|>` grounding grammar
//! - **Overlay compositing** - highlight fills, borders and index labels
//!   drawn through a swappable raster-canvas capability, encoded as JPEG
//! - **Workflow session** - explicit state machine with an atomic reset of
//!   all derived state and at-most-one-live bounds on overlay and capture
//!   handles
//! - **Capture** - webcam snapshots with a constraint fallback ladder
//!   (feature `capture`)
//!
//! # Example
//!
//! ```rust,no_run
//! use markbox::overlay::{compose, OverlayStyle};
//! use markbox::{OcrClient, OutputFormat, Session, SourceImage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut session = Session::new();
//!     session.commit_source(SourceImage::open("scan.png").await?)?;
//!
//!     let client = OcrClient::new(markbox::DEFAULT_URL)?;
//!     session.begin_extraction()?;
//!     let source = session.source().expect("source just committed");
//!     match client.recognize(source, OutputFormat::Text).await {
//!         Ok(text) => {
//!             session.complete_extraction(&text)?;
//!         }
//!         Err(err) => session.fail_extraction(&err.to_string())?,
//!     }
//!
//!     if !session.regions().is_empty() {
//!         let source = session.source().expect("source survives extraction");
//!         let overlay = compose(source, session.regions(), &OverlayStyle::default()).await?;
//!         session.attach_overlay(overlay)?;
//!         let name = session.download_name().expect("source is set");
//!         tokio::fs::write(&name, session.take_overlay()?.into_bytes()).await?;
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(feature = "capture")]
pub mod capture;
pub mod client;
pub mod error;
pub mod marker;
pub mod overlay;
pub mod region;
pub mod session;

#[cfg(feature = "capture")]
pub use capture::{CaptureError, CaptureStream};
pub use client::{Health, OcrClient, OcrResponse, OutputFormat, DEFAULT_URL};
pub use error::Error;
pub use marker::parse;
pub use region::{BBox, OverlayImage, SourceImage, TextRegion};
pub use session::{Session, WorkflowEvent, WorkflowState, DOWNLOAD_PREFIX};

/// Version of markbox
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
