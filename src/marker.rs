//! Parser for the DeepSeek-OCR grounding marker grammar.
//!
//! Grounded recognition responses inline geometry into the text stream:
//!
//! ```text
//! <|ref|>text<|/ref|><|det|>[[x1,y1,x2,y2]]<|/det|>recognized span
//! ```
//!
//! [`parse`] is total and pure: malformed blocks contribute nothing and
//! parsing continues with the rest of the stream. Partial extraction beats
//! all-or-nothing failure here — the service's formatting drifts between
//! model revisions.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::region::{BBox, TextRegion};

/// Block delimiter emitted before every grounded span.
const REF_DELIMITER: &str = "<|ref|>text<|/ref|>";

/// Detection marker: exactly `<|det|>[[A,B,C,D]]<|/det|>` with unsigned
/// decimal integers. No whitespace, signs or fractions.
static DET_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<\|det\|>\[\[([0-9]+),([0-9]+),([0-9]+),([0-9]+)\]\]<\|/det\|>")
        .expect("detection marker pattern compiles")
});

/// Parse a raw marker-annotated stream into ordered text regions.
///
/// Output order equals source-document order. A block is silently skipped
/// when it is blank, lacks a well-formed detection marker, or has no text
/// after the marker; only the first marker in a block counts.
#[must_use]
pub fn parse(raw: &str) -> Vec<TextRegion> {
    let mut regions = Vec::new();

    for block in raw.split(REF_DELIMITER) {
        if block.trim().is_empty() {
            continue;
        }

        let Some(caps) = DET_MARKER.captures(block) else {
            debug!("block without detection marker skipped");
            continue;
        };

        let Some(bbox) = bbox_from_captures(&caps) else {
            debug!("detection marker with out-of-range coordinates skipped");
            continue;
        };

        // Region text is everything after the marker's closing tag.
        let marker = caps.get(0).expect("whole-match group always present");
        let text = block[marker.end()..].trim();
        if text.is_empty() {
            debug!("block with empty trailing text skipped");
            continue;
        }

        regions.push(TextRegion {
            text: text.to_string(),
            bbox,
        });
    }

    regions
}

fn bbox_from_captures(caps: &regex::Captures<'_>) -> Option<BBox> {
    // The pattern guarantees digits; parse can still overflow u32.
    let coord = |i: usize| caps[i].parse::<u32>().ok();
    Some(BBox::new(coord(1)?, coord(2)?, coord(3)?, coord(4)?))
}
