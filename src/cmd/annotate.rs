use std::path::PathBuf;

use anyhow::{Context, Result};

use markbox::overlay::{compose, OverlayStyle};
use markbox::{OcrClient, OutputFormat, Session, SourceImage};

/// Full workflow: commit the source, extract, compose, write the overlay.
/// Drives the session state machine end to end.
pub async fn cmd_annotate(
    image: PathBuf,
    output: Option<PathBuf>,
    url: &str,
    format: OutputFormat,
    base64: bool,
) -> Result<()> {
    let mut session = Session::new();
    session.commit_source(SourceImage::open(&image).await?)?;
    let client = OcrClient::new(url)?;

    session.begin_extraction()?;
    let source = session.source().context("source just committed")?;
    let result = if base64 {
        client.recognize_base64(source, format).await
    } else {
        client.recognize(source, format).await
    };
    match result {
        Ok(text) => {
            session.complete_extraction(&text)?;
        }
        Err(err) => {
            session.fail_extraction(&err.to_string())?;
            return Err(err.into());
        }
    }

    if session.regions().is_empty() {
        println!("⚠️  response carried no grounded regions; nothing to draw");
        return Ok(());
    }
    println!("🔎 {} regions recognized", session.regions().len());

    let source = session.source().context("source survives extraction")?;
    let overlay = compose(source, session.regions(), &OverlayStyle::default()).await?;
    session.attach_overlay(overlay)?;

    let path = match output {
        Some(path) => path,
        None => PathBuf::from(session.download_name().context("source is committed")?),
    };
    let overlay = session.take_overlay()?;
    tokio::fs::write(&path, overlay.into_bytes())
        .await
        .with_context(|| format!("could not write {}", path.display()))?;
    println!("✅ wrote {}", path.display());
    Ok(())
}
