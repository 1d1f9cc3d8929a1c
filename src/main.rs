//! `markbox` CLI - drive the OCR grounding workflow from the terminal

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use markbox::OutputFormat;

mod cmd;

#[derive(Parser)]
#[command(name = "markbox")]
#[command(about = "DeepSeek-OCR grounding client: extract text regions and render overlays")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse raw marker text into regions
    Parse {
        /// File with marker-annotated text (stdin when omitted)
        file: Option<PathBuf>,

        /// Emit regions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send an image to the recognition service and print its regions
    Extract {
        /// Image file to recognize
        image: PathBuf,

        /// Recognition service URL (also: MARKBOX_URL)
        #[arg(short, long)]
        url: Option<String>,

        /// Output format requested from the service
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Use the JSON base64 endpoint instead of multipart upload
        #[arg(long)]
        base64: bool,

        /// Emit regions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Full workflow: extract, compose the overlay, write it out
    Annotate {
        /// Image file to recognize
        image: PathBuf,

        /// Output file (default: ocr_overlay_<source name>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Recognition service URL (also: MARKBOX_URL)
        #[arg(short, long)]
        url: Option<String>,

        /// Output format requested from the service
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Use the JSON base64 endpoint instead of multipart upload
        #[arg(long)]
        base64: bool,
    },

    /// Compose an overlay from an image and saved marker text, no network
    Render {
        /// Image file
        image: PathBuf,

        /// File with marker-annotated text
        markers: PathBuf,

        /// Output file (default: ocr_overlay_<source name>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Snapshot a frame from a capture device
    #[cfg(feature = "capture")]
    Capture {
        /// Device index
        #[arg(short, long, default_value = "0")]
        index: u32,

        /// Output file
        #[arg(short, long, default_value = "capture.png")]
        output: PathBuf,

        /// List capture devices and exit
        #[arg(long)]
        list: bool,
    },

    /// Check recognition service health
    Health {
        /// Recognition service URL (also: MARKBOX_URL)
        #[arg(short, long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    match cli.command {
        Commands::Parse { file, json } => {
            cmd::parse::cmd_parse(file, json)?;
        }
        Commands::Extract {
            image,
            url,
            format,
            base64,
            json,
        } => {
            cmd::extract::cmd_extract(image, &cmd::service_url(url), format, base64, json).await?;
        }
        Commands::Annotate {
            image,
            output,
            url,
            format,
            base64,
        } => {
            cmd::annotate::cmd_annotate(image, output, &cmd::service_url(url), format, base64)
                .await?;
        }
        Commands::Render {
            image,
            markers,
            output,
        } => {
            cmd::render::cmd_render(image, markers, output).await?;
        }
        #[cfg(feature = "capture")]
        Commands::Capture {
            index,
            output,
            list,
        } => {
            cmd::capture::cmd_capture(index, output, list).await?;
        }
        Commands::Health { url } => {
            cmd::health::cmd_health(&cmd::service_url(url)).await?;
        }
    }

    Ok(())
}
