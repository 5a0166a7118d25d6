//! Configuration of the dualsub library
//!
//! All timing knobs of the overlay (hover debounce, setup retries, HTTP
//! timeouts) live here, together with the translation target.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, Result};
use crate::setup::RetryPolicy;

/// Default endpoint of the public Google translate API
pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Language code translations are requested in
    pub target_lang: String,
    /// Translation endpoint (`translate_a/single` compatible)
    pub translate_endpoint: String,
    /// Hover quiescence window before a lookup is issued, in milliseconds
    pub hover_debounce_ms: u64,
    /// Number of retries after the first failed setup attempt
    pub setup_max_retries: u32,
    /// Delay between setup attempts, in milliseconds
    pub setup_retry_delay_ms: u64,
    /// Timeout for outbound HTTP requests, in seconds
    pub request_timeout_secs: u64,
    /// Cache the source-text fallback of a failed translation
    pub cache_failed_translations: bool,
    /// Caption languages the overlay is shown for
    pub source_languages: Vec<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            target_lang: "en".to_string(),
            translate_endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            hover_debounce_ms: 200,
            setup_max_retries: 5,
            setup_retry_delay_ms: 1000,
            request_timeout_secs: 10,
            cache_failed_translations: true,
            source_languages: ["ru", "uk", "de", "fr"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl OverlayConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: OverlayConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.target_lang.trim().is_empty() {
            return Err(OverlayError::Configuration("target_lang must not be empty".to_string()));
        }
        if self.translate_endpoint.trim().is_empty() {
            return Err(OverlayError::Configuration("translate_endpoint must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(OverlayError::Configuration("request_timeout_secs must be positive".to_string()));
        }
        if self.source_languages.is_empty() {
            return Err(OverlayError::Configuration("source_languages must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.hover_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry policy used for session setup
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.setup_max_retries, Duration::from_millis(self.setup_retry_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OverlayConfig::default();
        assert_eq!(config.target_lang, "en");
        assert_eq!(config.debounce(), Duration::from_millis(200));
        assert_eq!(config.retry_policy().max_retries(), 5);
        assert_eq!(config.retry_policy().delay(), Duration::from_millis(1000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = OverlayConfig::from_json_str(r#"{"target_lang": "es", "hover_debounce_ms": 50}"#).unwrap();
        assert_eq!(config.target_lang, "es");
        assert_eq!(config.hover_debounce_ms, 50);
        assert_eq!(config.setup_max_retries, 5);
        assert_eq!(config.source_languages.len(), 4);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = OverlayConfig::from_json_str(r#"{"request_timeout_secs": 0}"#).unwrap_err();
        assert!(matches!(err, OverlayError::Configuration(_)));

        let err = OverlayConfig::from_json_str(r#"{"target_lang": "  "}"#).unwrap_err();
        assert!(matches!(err, OverlayError::Configuration(_)));

        assert!(matches!(OverlayConfig::from_json_str("not json"), Err(OverlayError::Json(_))));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.json");
        std::fs::write(&path, r#"{"setup_max_retries": 2, "cache_failed_translations": false}"#).unwrap();

        let config = OverlayConfig::from_json_file(&path).unwrap();
        assert_eq!(config.setup_max_retries, 2);
        assert!(!config.cache_failed_translations);
    }
}
