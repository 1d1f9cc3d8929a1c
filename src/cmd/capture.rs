use std::path::PathBuf;

use anyhow::{Context, Result};

use markbox::{CaptureStream, SourceImage};

pub async fn cmd_capture(index: u32, output: PathBuf, list: bool) -> Result<()> {
    if list {
        let devices = CaptureStream::list()?;
        if devices.is_empty() {
            println!("no capture devices");
            return Ok(());
        }
        for (i, name) in devices.iter().enumerate() {
            println!("{i:<3} {name}");
        }
        return Ok(());
    }

    let file_name = output
        .file_name()
        .map_or_else(|| "capture.png".to_string(), |n| n.to_string_lossy().to_string());

    // Device IO is blocking; keep it off the async workers.
    let source = tokio::task::spawn_blocking(move || -> Result<SourceImage> {
        let mut stream = CaptureStream::open(index)?;
        println!("📷 {}", stream.name());
        let snapshot = stream.snapshot(&file_name)?;
        stream.close();
        Ok(snapshot)
    })
    .await
    .context("capture task panicked")??;

    tokio::fs::write(&output, &source.data)
        .await
        .with_context(|| format!("could not write {}", output.display()))?;
    println!(
        "✅ wrote {} ({}x{})",
        output.display(),
        source.width,
        source.height
    );
    Ok(())
}
