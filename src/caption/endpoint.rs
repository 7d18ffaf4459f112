use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::CaptionerConfig;
use crate::error::{Result, PodpisError};
use super::Captioner;

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Remote captioner for OpenAI-compatible vision endpoints. The image is
/// posted inline as a base64 data URL.
pub struct EndpointCaptioner {
    client: Client,
    config: CaptionerConfig,
}

impl EndpointCaptioner {
    pub fn new(config: CaptionerConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, config }
    }
}

fn image_mime(image_path: &Path) -> &'static str {
    let extension = image_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

#[async_trait]
impl Captioner for EndpointCaptioner {
    async fn ensure_loaded(&mut self) -> Result<()> {
        // The model lives on the remote side, nothing to load here
        Ok(())
    }

    async fn caption(&mut self, image_path: &Path) -> Result<String> {
        let data = tokio::fs::read(image_path).await?;
        let data_url = format!(
            "data:{};base64,{}",
            image_mime(image_path),
            general_purpose::STANDARD.encode(&data)
        );

        let request = ChatRequest {
            model: self.config.endpoint_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: json!([
                    { "type": "text", "text": self.config.prompt },
                    { "type": "image_url", "image_url": { "url": data_url } },
                ]),
            }],
            max_tokens: self.config.max_length,
        };

        debug!("Sending caption request to: {}", self.config.endpoint);

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| PodpisError::Captioner(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PodpisError::Captioner(format!(
                "Caption endpoint error {}: {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| PodpisError::Captioner(format!("Failed to parse response: {}", e)))?;

        chat_response
            .choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| PodpisError::Captioner("No choices in endpoint response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(image_mime(Path::new("photo.png")), "image/png");
        assert_eq!(image_mime(Path::new("photo.PNG")), "image/png");
        assert_eq!(image_mime(Path::new("photo.gif")), "image/gif");
        assert_eq!(image_mime(Path::new("photo.jpg")), "image/jpeg");
        assert_eq!(image_mime(Path::new("photo")), "image/jpeg");
    }
}
