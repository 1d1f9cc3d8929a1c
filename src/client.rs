//! Client for the DeepSeek-OCR recognition service.
//!
//! The service exposes three endpoints:
//! - `POST /ocr` - multipart `file` + `output_format`
//! - `POST /ocr-base64` - JSON `{image_base64, output_format}`
//! - `GET /health` - liveness + model state
//!
//! Responses share one shape: `{success, text?, error?, format?}`. When
//! grounding is active, `text` carries the marker grammar that
//! [`crate::marker::parse`] understands.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
use crate::region::SourceImage;

/// Default service address (the reference deployment listens on 9000).
pub const DEFAULT_URL: &str = "http://127.0.0.1:9000";

/// Fallback message when the service reports failure without detail.
const GENERIC_FAILURE: &str = "recognition failed with no further detail";

/// Requested output flavor of the recognition pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
}

impl OutputFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "markdown" => Ok(Self::Markdown),
            other => Err(format!("unknown output format: {other} (use text|markdown)")),
        }
    }
}

/// Wire shape of every recognition response.
#[derive(Debug, Deserialize)]
pub struct OcrResponse {
    pub success: bool,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

/// Wire shape of `GET /health`.
#[derive(Debug, Deserialize)]
pub struct Health {
    pub status: String,
    pub model_loaded: bool,
}

#[derive(Serialize)]
struct Base64Request<'a> {
    image_base64: String,
    output_format: &'a str,
}

/// HTTP client for one recognition service deployment.
pub struct OcrClient {
    http: reqwest::Client,
    base: Url,
}

impl OcrClient {
    /// Create a client with the default 120 s request timeout.
    ///
    /// The reference deployment defines no timeout at all; recognition on a
    /// loaded GPU can take a while, so the default stays generous.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(120))
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .tcp_nodelay(true)
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(Error::BadUrl)
    }

    /// Recognize text via the multipart `POST /ocr` form.
    ///
    /// Transport-level failures surface as [`Error::Transport`]; a response
    /// with `success == false` (or a non-2xx status) as [`Error::Service`]
    /// carrying the service-supplied message when there is one.
    pub async fn recognize(&self, source: &SourceImage, format: OutputFormat) -> Result<String> {
        let url = self.endpoint("ocr")?;
        info!(%url, name = %source.name, %format, "sending image for recognition");

        let mime = image::guess_format(&source.data)
            .map(|f| f.to_mime_type())
            .unwrap_or("image/png");
        let part = multipart::Part::bytes(source.data.clone())
            .file_name(source.name.clone())
            .mime_str(mime)?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("output_format", format.as_str());

        let response = self.http.post(url).multipart(form).send().await?;
        Self::unwrap_response(response).await
    }

    /// Recognize text via the JSON `POST /ocr-base64` form.
    pub async fn recognize_base64(
        &self,
        source: &SourceImage,
        format: OutputFormat,
    ) -> Result<String> {
        let url = self.endpoint("ocr-base64")?;
        info!(%url, name = %source.name, %format, "sending base64 image for recognition");

        let body = Base64Request {
            image_base64: BASE64.encode(&source.data),
            output_format: format.as_str(),
        };
        let response = self.http.post(url).json(&body).send().await?;
        Self::unwrap_response(response).await
    }

    /// Query service liveness and model state.
    pub async fn health(&self) -> Result<Health> {
        let url = self.endpoint("health")?;
        debug!(%url, "health check");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Service {
                message: format!("health endpoint returned {status}"),
            });
        }
        Ok(response.json::<Health>().await?)
    }

    async fn unwrap_response(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Service {
                message: format!("recognition service returned {status}"),
            });
        }
        let body: OcrResponse = response.json().await?;
        Self::text_from(body)
    }

    fn text_from(body: OcrResponse) -> Result<String> {
        if !body.success {
            return Err(Error::Service {
                message: body.error.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            });
        }
        body.text.ok_or_else(|| Error::Service {
            message: GENERIC_FAILURE.to_string(),
        })
    }
}
