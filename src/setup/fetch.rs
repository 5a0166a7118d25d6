//! Caption payload download

use async_trait::async_trait;
use reqwest::Client;

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};

/// Downloads the caption payload of a subtitle URL
#[async_trait]
pub trait CaptionFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches captions over HTTP
pub struct HttpCaptionFetcher {
    client: Client,
}

impl HttpCaptionFetcher {
    pub fn new(config: &OverlayConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CaptionFetcher for HttpCaptionFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("Fetching captions from {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OverlayError::Setup(format!("HTTP {} fetching captions", status)));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(OverlayError::Setup("caption payload is empty".to_string()));
        }
        Ok(body)
    }
}
