//! Translation service client
//!
//! Talks to the public `translate_a/single` endpoint. The response is a
//! nested array; the translated text of the first segment lives at
//! `[0][0][0]`, any other shape is treated as a failure.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};

/// Something that can translate a piece of text
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;
}

/// Pull the translated string out of a `translate_a/single` response
pub fn extract_translation(response: &Value) -> Result<String> {
    response
        .get(0)
        .and_then(|sentences| sentences.get(0))
        .and_then(|segment| segment.get(0))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            OverlayError::InvalidFormat(format!("unexpected translation response: {}", response))
        })
}

/// Google translate backend
pub struct GoogleTranslateClient {
    client: Client,
    endpoint: String,
}

impl GoogleTranslateClient {
    pub fn new(config: &OverlayConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self::with_client(client, config.translate_endpoint.clone()))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TranslationBackend for GoogleTranslateClient {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        log::debug!("Requesting translation of {:?} to {}", text, target_lang);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OverlayError::Translation(format!("HTTP {}: {}", status, body)));
        }

        let body: Value = response.json().await?;
        extract_translation(&body)
    }
}
