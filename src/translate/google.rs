use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, PodpisError};
use super::Translator;

/// Translator backed by the Google web translation endpoint (the keyless
/// `gtx` client used by the translate widget). Responses are nested JSON
/// arrays rather than objects.
pub struct GoogleWebTranslator {
    client: Client,
    config: TranslateConfig,
}

impl GoogleWebTranslator {
    pub fn new(config: TranslateConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, config }
    }
}

#[async_trait]
impl Translator for GoogleWebTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String> {
        debug!("Sending translation request to: {}", self.config.endpoint);

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source_language),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| PodpisError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PodpisError::Translation(format!(
                "Translation API error: HTTP {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PodpisError::Translation(format!("Failed to parse response: {}", e)))?;

        extract_translation(&body).ok_or_else(|| {
            PodpisError::Translation("Unexpected translation response shape".to_string())
        })
    }
}

// The first element of the first sentence chunk holds the translated text.
fn extract_translation(body: &Value) -> Option<String> {
    let translated = body.get(0)?.get(0)?.get(0)?.as_str()?;
    Some(translated.trim().to_string())
}
