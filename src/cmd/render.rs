use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use markbox::overlay::{compose, OverlayStyle};
use markbox::{SourceImage, DOWNLOAD_PREFIX};

/// Compose an overlay from an image plus saved marker text — no network.
pub async fn cmd_render(image: PathBuf, markers: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let source = SourceImage::open(&image).await?;
    let raw = tokio::fs::read_to_string(&markers)
        .await
        .with_context(|| format!("could not read {}", markers.display()))?;

    let regions = markbox::parse(&raw);
    if regions.is_empty() {
        bail!("no regions parsed from {}", markers.display());
    }

    let overlay = compose(&source, &regions, &OverlayStyle::default()).await?;
    let path =
        output.unwrap_or_else(|| PathBuf::from(format!("{DOWNLOAD_PREFIX}{}", source.name)));
    tokio::fs::write(&path, overlay.into_bytes())
        .await
        .with_context(|| format!("could not write {}", path.display()))?;
    println!("✅ wrote {} ({} regions)", path.display(), regions.len());
    Ok(())
}
