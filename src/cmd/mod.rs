//! CLI subcommand implementations.

pub mod annotate;
#[cfg(feature = "capture")]
pub mod capture;
pub mod extract;
pub mod health;
pub mod parse;
pub mod render;

use anyhow::Result;
use markbox::{TextRegion, DEFAULT_URL};

/// Service URL resolution: explicit flag, then `MARKBOX_URL`, then default.
pub(crate) fn service_url(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var("MARKBOX_URL").ok())
        .unwrap_or_else(|| DEFAULT_URL.to_string())
}

/// Print regions as a table or JSON.
pub(crate) fn print_regions(regions: &[TextRegion], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(regions)?);
        return Ok(());
    }
    if regions.is_empty() {
        println!("no regions");
        return Ok(());
    }
    println!("{:<5} {:<24} TEXT", "#", "BBOX");
    for (idx, region) in regions.iter().enumerate() {
        let b = region.bbox;
        println!(
            "{:<5} {:<24} {}",
            idx + 1,
            format!("[{},{},{},{}]", b.x1, b.y1, b.x2, b.y2),
            region.text
        );
    }
    Ok(())
}
