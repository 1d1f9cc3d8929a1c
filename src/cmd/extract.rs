use std::path::PathBuf;

use anyhow::Result;

use markbox::{OcrClient, OutputFormat, SourceImage};

use super::print_regions;

pub async fn cmd_extract(
    image: PathBuf,
    url: &str,
    format: OutputFormat,
    base64: bool,
    json: bool,
) -> Result<()> {
    let source = SourceImage::open(&image).await?;
    println!(
        "📄 {} ({}x{}, {} bytes)",
        source.name,
        source.width,
        source.height,
        source.data.len()
    );

    let client = OcrClient::new(url)?;
    let text = if base64 {
        client.recognize_base64(&source, format).await?
    } else {
        client.recognize(&source, format).await?
    };

    let regions = markbox::parse(&text);
    if json {
        print_regions(&regions, true)?;
    } else {
        println!("{text}");
        println!();
        print_regions(&regions, false)?;
    }
    Ok(())
}
