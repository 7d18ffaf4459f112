use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, PodpisError};

// Default values for optional configuration fields
fn default_seed() -> u64 {
    1337
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_translate_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub captioner: CaptionerConfig,
    pub translate: TranslateConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionerConfig {
    /// Captioner backend: local BLIP inference or a remote vision endpoint
    pub backend: CaptionerBackend,
    /// BLIP variant: base or large
    pub variant: String,
    /// Path to GGUF weights; resolved from the variant when empty
    #[serde(default)]
    pub model: String,
    /// Path to tokenizer.json; resolved from the variant when empty
    #[serde(default)]
    pub tokenizer: String,
    /// Maximum caption length in decoder tokens
    pub max_length: usize,
    /// Decoder sampling seed
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Remote vision endpoint URL (endpoint backend only)
    pub endpoint: String,
    /// Model name sent to the remote endpoint
    pub endpoint_model: String,
    /// Instruction sent to the remote endpoint
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CaptionerBackend {
    /// Blip: run BLIP locally with lazily-loaded weights
    Blip,
    /// Endpoint: post the image to an OpenAI-compatible vision endpoint
    Endpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Enable best-effort caption translation
    #[serde(default = "default_translate_enabled")]
    pub enabled: bool,
    /// Translation endpoint URL
    pub endpoint: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Upper bound on translation wait time in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Image file extensions picked up by directory scans (case-insensitive)
    pub extensions: Vec<String>,
    /// Scan subdirectories as well
    pub recursive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            captioner: CaptionerConfig {
                backend: CaptionerBackend::Blip,
                variant: "base".to_string(),
                model: String::new(),
                tokenizer: String::new(),
                max_length: 50,
                seed: 1337,
                endpoint: "http://localhost:8001/v1/chat/completions".to_string(),
                endpoint_model: "default".to_string(),
                prompt: "Describe this image in one sentence.".to_string(),
            },
            translate: TranslateConfig {
                enabled: true,
                endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
                source_language: "en".to_string(),
                target_language: "ru".to_string(),
                timeout_secs: 10,
            },
            scan: ScanConfig {
                extensions: vec![
                    "png".to_string(),
                    "jpg".to_string(),
                    "jpeg".to_string(),
                    "gif".to_string(),
                    "bmp".to_string(),
                ],
                recursive: true,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PodpisError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| PodpisError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PodpisError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| PodpisError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.captioner.variant, config.captioner.variant);
        assert_eq!(parsed.captioner.max_length, config.captioner.max_length);
        assert_eq!(parsed.translate.target_language, config.translate.target_language);
        assert_eq!(parsed.scan.extensions, config.scan.extensions);
    }

    #[test]
    fn optional_fields_fall_back_to_defaults() {
        let text = r#"
            [captioner]
            backend = "Blip"
            variant = "base"
            max_length = 50
            endpoint = "http://localhost:8001/v1/chat/completions"
            endpoint_model = "default"
            prompt = "Describe this image in one sentence."

            [translate]
            endpoint = "https://translate.googleapis.com/translate_a/single"
            source_language = "en"
            target_language = "ru"

            [scan]
            extensions = ["png"]
            recursive = false
        "#;

        let parsed: Config = toml::from_str(text).unwrap();
        assert!(parsed.translate.enabled);
        assert_eq!(parsed.translate.timeout_secs, 10);
        assert_eq!(parsed.captioner.seed, 1337);
        assert_eq!(parsed.captioner.model, "");
    }
}
