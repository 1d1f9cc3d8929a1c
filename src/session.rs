//! Workflow session: state machine plus resource lifecycle.
//!
//! All derived state — result text, parsed regions, the overlay handle —
//! lives in one place and mutates only through transition methods. The
//! reset of that trio is a single method, so the three can never be
//! observed in a partially-updated combination. Disallowed transitions are
//! rejected with [`Error::InvalidTransition`] rather than silently ignored.
//!
//! Resource bounds enforced structurally: at most one committed source, at
//! most one live overlay, one orthogonal capture flag.

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::marker;
use crate::region::{OverlayImage, SourceImage, TextRegion};

/// Prefix of the downloadable overlay file name; the source file's name is
/// appended to it.
pub const DOWNLOAD_PREFIX: &str = "ocr_overlay_";

/// Where the workflow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    /// No source committed yet.
    #[default]
    Idle,
    /// A source image is committed; no extraction in flight.
    SourceSelected,
    /// Recognition call in flight.
    Processing,
    /// Recognition finished; regions parsed.
    Resulted,
    /// An overlay is live for the current result.
    OverlayReady,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::SourceSelected => "source-selected",
            Self::Processing => "processing",
            Self::Resulted => "resulted",
            Self::OverlayReady => "overlay-ready",
        })
    }
}

/// The transition that was attempted, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    CommitSource,
    BeginExtraction,
    CompleteExtraction,
    FailExtraction,
    AttachOverlay,
    TakeOverlay,
    OpenCapture,
}

impl fmt::Display for WorkflowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CommitSource => "commit a source",
            Self::BeginExtraction => "begin extraction",
            Self::CompleteExtraction => "complete extraction",
            Self::FailExtraction => "fail extraction",
            Self::AttachOverlay => "attach an overlay",
            Self::TakeOverlay => "take the overlay",
            Self::OpenCapture => "open capture",
        })
    }
}

/// One user workflow from source selection to overlay download.
///
/// The session is the sole mutator of its overlay slot; creating a new
/// overlay or committing a new source always releases the previous handle
/// first.
#[derive(Debug, Default)]
pub struct Session {
    state: WorkflowState,
    capture_active: bool,
    source: Option<SourceImage>,
    result_text: String,
    regions: Vec<TextRegion>,
    overlay: Option<OverlayImage>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    #[must_use]
    pub fn capture_active(&self) -> bool {
        self.capture_active
    }

    #[must_use]
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    #[must_use]
    pub fn result_text(&self) -> &str {
        &self.result_text
    }

    #[must_use]
    pub fn regions(&self) -> &[TextRegion] {
        &self.regions
    }

    #[must_use]
    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// Overlay file name: the fixed prefix with the source name appended.
    #[must_use]
    pub fn download_name(&self) -> Option<String> {
        self.source
            .as_ref()
            .map(|s| format!("{DOWNLOAD_PREFIX}{}", s.name))
    }

    fn reject(&self, event: WorkflowEvent) -> Error {
        Error::InvalidTransition {
            from: self.state,
            event,
        }
    }

    /// Clear result text, regions and any live overlay as one step.
    ///
    /// The single mutation point for the derived trio; every reset-triggering
    /// transition funnels through here.
    fn reset_derived(&mut self, result_text: String) {
        self.result_text = result_text;
        self.regions.clear();
        // Dropping the handle releases the one live overlay.
        self.overlay = None;
    }

    /// Commit a new source image (upload or captured photo).
    ///
    /// Allowed from every state except `Processing`: rejecting the commit
    /// while a recognition call is in flight is what keeps a stale response
    /// from ever pairing with a newer source. Performs the atomic reset and
    /// implicitly closes capture.
    pub fn commit_source(&mut self, source: SourceImage) -> Result<()> {
        if self.state == WorkflowState::Processing {
            return Err(self.reject(WorkflowEvent::CommitSource));
        }
        info!(
            name = %source.name,
            width = source.width,
            height = source.height,
            "source committed"
        );
        self.reset_derived(String::new());
        self.source = Some(source);
        self.capture_active = false;
        self.state = WorkflowState::SourceSelected;
        Ok(())
    }

    /// Start an extraction attempt. Requires a committed source and no
    /// extraction already in flight.
    pub fn begin_extraction(&mut self) -> Result<()> {
        if self.state == WorkflowState::Processing {
            return Err(self.reject(WorkflowEvent::BeginExtraction));
        }
        if self.source.is_none() {
            return Err(Error::NoSource);
        }
        debug!("extraction started");
        self.reset_derived(String::new());
        self.state = WorkflowState::Processing;
        Ok(())
    }

    /// Record a successful recognition response; regions come from the
    /// marker parser.
    pub fn complete_extraction(&mut self, text: &str) -> Result<&[TextRegion]> {
        if self.state != WorkflowState::Processing {
            return Err(self.reject(WorkflowEvent::CompleteExtraction));
        }
        self.regions = marker::parse(text);
        self.result_text = text.to_string();
        self.overlay = None;
        self.state = WorkflowState::Resulted;
        info!(regions = self.regions.len(), "extraction complete");
        Ok(&self.regions)
    }

    /// Record a failed recognition attempt: result text becomes the error
    /// indicator, regions clear, no overlay survives.
    pub fn fail_extraction(&mut self, message: &str) -> Result<()> {
        if self.state != WorkflowState::Processing {
            return Err(self.reject(WorkflowEvent::FailExtraction));
        }
        warn!(%message, "extraction failed");
        self.reset_derived(format!("Error: {message}"));
        self.state = WorkflowState::SourceSelected;
        Ok(())
    }

    /// Attach a freshly composed overlay. Requires a non-empty region
    /// sequence and no live overlay.
    pub fn attach_overlay(&mut self, overlay: OverlayImage) -> Result<()> {
        if self.state != WorkflowState::Resulted {
            return Err(self.reject(WorkflowEvent::AttachOverlay));
        }
        if self.regions.is_empty() {
            return Err(Error::NoRegions);
        }
        if self.overlay.is_some() {
            return Err(Error::OverlayLive);
        }
        debug!(bytes = overlay.len(), "overlay attached");
        self.overlay = Some(overlay);
        self.state = WorkflowState::OverlayReady;
        Ok(())
    }

    /// Consume the one-time overlay handle; the workflow falls back to
    /// `Resulted` so a replacement can be composed.
    pub fn take_overlay(&mut self) -> Result<OverlayImage> {
        if self.state != WorkflowState::OverlayReady {
            return Err(self.reject(WorkflowEvent::TakeOverlay));
        }
        let overlay = self
            .overlay
            .take()
            .ok_or_else(|| self.reject(WorkflowEvent::TakeOverlay))?;
        self.state = WorkflowState::Resulted;
        Ok(overlay)
    }

    /// Open the capture UI flag. Only meaningful before a result exists.
    pub fn open_capture(&mut self) -> Result<()> {
        match self.state {
            WorkflowState::Idle | WorkflowState::SourceSelected if !self.capture_active => {
                self.capture_active = true;
                Ok(())
            }
            _ => Err(self.reject(WorkflowEvent::OpenCapture)),
        }
    }

    /// Close the capture UI flag (explicit cancel). Releasing the hardware
    /// stream is the caller's job; canceling never touches an in-flight
    /// recognition call.
    pub fn close_capture(&mut self) {
        self.capture_active = false;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_source(name: &str, w: u32, h: u32) -> SourceImage {
        let mut png = Vec::new();
        image::RgbaImage::new(w, h)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        SourceImage::from_bytes(name, png).unwrap()
    }

    fn overlay_stub() -> OverlayImage {
        OverlayImage::new(vec![0xFF, 0xD8], 8, 8)
    }

    const MARKED: &str = "<|ref|>text<|/ref|><|det|>[[10,20,110,60]]<|/det|>Hello";

    /// The derived trio must reset together: empty-or-error text, zero
    /// regions, no overlay.
    fn assert_reset(session: &Session) {
        assert!(
            session.result_text().is_empty() || session.result_text().starts_with("Error:"),
            "text: {:?}",
            session.result_text()
        );
        assert!(session.regions().is_empty());
        assert!(!session.has_overlay());
    }

    fn session_with_overlay() -> Session {
        let mut session = Session::new();
        session.commit_source(png_source("a.png", 8, 8)).unwrap();
        session.begin_extraction().unwrap();
        session.complete_extraction(MARKED).unwrap();
        session.attach_overlay(overlay_stub()).unwrap();
        session
    }

    #[test]
    fn test_happy_path_states() {
        let mut session = Session::new();
        assert_eq!(session.state(), WorkflowState::Idle);

        session.commit_source(png_source("a.png", 8, 8)).unwrap();
        assert_eq!(session.state(), WorkflowState::SourceSelected);

        session.begin_extraction().unwrap();
        assert_eq!(session.state(), WorkflowState::Processing);

        let regions = session.complete_extraction(MARKED).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(session.state(), WorkflowState::Resulted);

        session.attach_overlay(overlay_stub()).unwrap();
        assert_eq!(session.state(), WorkflowState::OverlayReady);

        let overlay = session.take_overlay().unwrap();
        assert_eq!(overlay.into_bytes(), vec![0xFF, 0xD8]);
        assert_eq!(session.state(), WorkflowState::Resulted);
    }

    #[test]
    fn test_commit_resets_atomically() {
        let mut session = session_with_overlay();
        assert!(session.has_overlay());

        session.commit_source(png_source("b.png", 8, 8)).unwrap();
        assert_reset(&session);
        assert_eq!(session.state(), WorkflowState::SourceSelected);
        assert_eq!(session.source().unwrap().name, "b.png");
    }

    #[test]
    fn test_begin_extraction_resets_atomically() {
        let mut session = session_with_overlay();
        // OverlayReady -> new extraction attempt wipes the derived trio.
        session.begin_extraction().unwrap();
        assert_reset(&session);
        assert_eq!(session.state(), WorkflowState::Processing);
    }

    #[test]
    fn test_fail_extraction_resets_atomically() {
        let mut session = Session::new();
        session.commit_source(png_source("a.png", 8, 8)).unwrap();
        session.begin_extraction().unwrap();
        session.fail_extraction("service unreachable").unwrap();

        assert_reset(&session);
        assert_eq!(session.result_text(), "Error: service unreachable");
        assert_eq!(session.state(), WorkflowState::SourceSelected);
    }

    #[test]
    fn test_second_commit_before_extraction_wipes_first() {
        let mut session = Session::new();
        session.commit_source(png_source("first.png", 8, 8)).unwrap();
        session.commit_source(png_source("second.png", 8, 8)).unwrap();

        assert_reset(&session);
        assert_eq!(session.source().unwrap().name, "second.png");
    }

    #[test]
    fn test_at_most_one_live_overlay() {
        let mut session = session_with_overlay();
        // A second attach while one is live is rejected, not stacked.
        let err = session.attach_overlay(overlay_stub()).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[test]
    fn test_attach_requires_regions() {
        let mut session = Session::new();
        session.commit_source(png_source("a.png", 8, 8)).unwrap();
        session.begin_extraction().unwrap();
        // Well-formed response with zero extractable regions.
        session.complete_extraction("plain text, no markers").unwrap();

        let err = session.attach_overlay(overlay_stub()).unwrap_err();
        assert!(matches!(err, Error::NoRegions));
    }

    #[test]
    fn test_extraction_requires_source() {
        let mut session = Session::new();
        assert!(matches!(
            session.begin_extraction().unwrap_err(),
            Error::NoSource
        ));
    }

    #[test]
    fn test_commit_rejected_while_processing() {
        let mut session = Session::new();
        session.commit_source(png_source("a.png", 8, 8)).unwrap();
        session.begin_extraction().unwrap();

        // No stale-response race: the source cannot change mid-flight.
        let err = session
            .commit_source(png_source("b.png", 8, 8))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(session.source().unwrap().name, "a.png");
    }

    #[test]
    fn test_complete_rejected_outside_processing() {
        let mut session = Session::new();
        let err = session.complete_extraction(MARKED).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        session.commit_source(png_source("a.png", 8, 8)).unwrap();
        assert!(session.complete_extraction(MARKED).is_err());
    }

    #[test]
    fn test_double_begin_rejected() {
        let mut session = Session::new();
        session.commit_source(png_source("a.png", 8, 8)).unwrap();
        session.begin_extraction().unwrap();
        assert!(session.begin_extraction().is_err());
    }

    #[test]
    fn test_take_overlay_is_one_time() {
        let mut session = session_with_overlay();
        session.take_overlay().unwrap();
        assert!(session.take_overlay().is_err());
        assert!(!session.has_overlay());
    }

    #[test]
    fn test_capture_flag_lifecycle() {
        let mut session = Session::new();
        session.open_capture().unwrap();
        assert!(session.capture_active());
        // Re-entry while open is rejected.
        assert!(session.open_capture().is_err());

        session.close_capture();
        assert!(!session.capture_active());

        // Successful capture commits a source, implicitly closing capture.
        session.open_capture().unwrap();
        session.commit_source(png_source("cap.png", 8, 8)).unwrap();
        assert!(!session.capture_active());
    }

    #[test]
    fn test_capture_rejected_after_result() {
        let mut session = Session::new();
        session.commit_source(png_source("a.png", 8, 8)).unwrap();
        session.begin_extraction().unwrap();
        session.complete_extraction(MARKED).unwrap();

        assert!(session.open_capture().is_err());
    }

    #[test]
    fn test_download_name_appends_source_name() {
        let mut session = Session::new();
        assert!(session.download_name().is_none());

        session.commit_source(png_source("scan.png", 8, 8)).unwrap();
        assert_eq!(session.download_name().unwrap(), "ocr_overlay_scan.png");
    }

    #[test]
    fn test_failed_then_retry_succeeds() {
        let mut session = Session::new();
        session.commit_source(png_source("a.png", 8, 8)).unwrap();
        session.begin_extraction().unwrap();
        session.fail_extraction("boom").unwrap();

        session.begin_extraction().unwrap();
        session.complete_extraction(MARKED).unwrap();
        assert_eq!(session.regions().len(), 1);
        assert_eq!(session.state(), WorkflowState::Resulted);
    }
}
