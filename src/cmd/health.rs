use anyhow::Result;

use markbox::OcrClient;

pub async fn cmd_health(url: &str) -> Result<()> {
    let client = OcrClient::new(url)?;
    let health = client.health().await?;
    println!(
        "🩺 {} - status: {}, model loaded: {}",
        url, health.status, health.model_loaded
    );
    Ok(())
}
