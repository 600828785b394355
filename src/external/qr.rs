//! Table QR codes
//!
//! Images come from a URL-parameterised generator service
//! (`?size=WxH&data=...`) and are downloaded server-side.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("invalid QR service endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("QR service request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct QrClient {
    http: reqwest::Client,
    endpoint: String,
    size: u32,
}

impl QrClient {
    pub fn new(endpoint: impl Into<String>, size: u32) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: endpoint.into(),
            size,
        }
    }

    /// Generator URL that renders `data` as a QR image
    pub fn image_url(&self, data: &str) -> Result<reqwest::Url, QrError> {
        let size = format!("{}x{}", self.size, self.size);
        reqwest::Url::parse_with_params(&self.endpoint, &[("size", size.as_str()), ("data", data)])
            .map_err(|e| QrError::InvalidEndpoint(e.to_string()))
    }

    /// Download the PNG for `data`
    pub async fn download(&self, data: &str) -> Result<Vec<u8>, QrError> {
        let url = self.image_url(data)?;
        tracing::debug!("Fetching QR code: {}", url);

        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(bytes.to_vec())
    }
}

/// Customer-facing menu URL for a table
pub fn table_menu_url(public_url: &str, table_number: i32) -> String {
    format!("{}/menu?table={}", public_url.trim_end_matches('/'), table_number)
}
