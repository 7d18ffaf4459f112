use std::path::{Path, PathBuf};
use std::fs;
use tokio::fs as async_fs;
use reqwest::Client;
use tracing::info;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Result, PodpisError};
use crate::config::{CaptionerBackend, Config};

const TOKENIZER_SIZE_MB: f64 = 0.7;

pub struct SetupManager {
    client: Client,
    podpis_dir: PathBuf,
}

/// BLIP artifact pair for one model variant: quantized weights plus the
/// matching tokenizer
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub name: String,
    pub weights_filename: String,
    pub weights_url: String,
    pub tokenizer_filename: String,
    pub tokenizer_url: String,
    pub size_mb: f64,
}

impl SetupManager {
    pub fn new() -> Result<Self> {
        let podpis_dir = PathBuf::from(".podpis");

        // Create .podpis directory structure if it doesn't exist
        fs::create_dir_all(podpis_dir.join("models"))?;
        fs::create_dir_all(podpis_dir.join("log"))?;

        let client = Client::builder()
            .user_agent("podpis/0.1.0")
            .build()
            .map_err(PodpisError::Http)?;

        Ok(Self { client, podpis_dir })
    }

    /// Initialize the application, downloading necessary files if needed.
    ///
    /// Resolves the configured BLIP variant to local artifact paths; the
    /// endpoint backend needs no local files.
    pub async fn initialize(&self, config: &mut Config) -> Result<()> {
        if !matches!(config.captioner.backend, CaptionerBackend::Blip) {
            return Ok(());
        }

        info!("Checking BLIP artifacts for variant '{}'", config.captioner.variant);
        self.ensure_blip_artifacts(config).await?;
        info!("Initialization completed successfully");
        Ok(())
    }

    /// Ensure weights and tokenizer for the configured variant are available
    async fn ensure_blip_artifacts(&self, config: &mut Config) -> Result<()> {
        let artifact = self.select_artifact(&config.captioner.variant)?;

        if config.captioner.model.is_empty() || !Path::new(&config.captioner.model).exists() {
            let weights_path = self.models_dir().join(&artifact.weights_filename);
            if !weights_path.exists() {
                info!("BLIP weights not found: {}", artifact.weights_filename);
                self.download_file(&artifact.weights_url, &weights_path, artifact.size_mb)
                    .await?;
            }
            config.captioner.model = weights_path.to_string_lossy().to_string();
        }

        if config.captioner.tokenizer.is_empty()
            || !Path::new(&config.captioner.tokenizer).exists()
        {
            let tokenizer_path = self.models_dir().join(&artifact.tokenizer_filename);
            if !tokenizer_path.exists() {
                info!("BLIP tokenizer not found: {}", artifact.tokenizer_filename);
                self.download_file(&artifact.tokenizer_url, &tokenizer_path, TOKENIZER_SIZE_MB)
                    .await?;
            }
            config.captioner.tokenizer = tokenizer_path.to_string_lossy().to_string();
        }

        Ok(())
    }

    pub fn get_available_models(&self) -> Vec<ModelArtifact> {
        vec![
            ModelArtifact {
                name: "base".to_string(),
                weights_filename: "blip-image-captioning-base-q4k.gguf".to_string(),
                weights_url: "https://huggingface.co/lmz/candle-blip/resolve/main/blip-image-captioning-base-q4k.gguf".to_string(),
                tokenizer_filename: "tokenizer-base.json".to_string(),
                tokenizer_url: "https://huggingface.co/Salesforce/blip-image-captioning-base/resolve/main/tokenizer.json".to_string(),
                size_mb: 131.0,
            },
            ModelArtifact {
                name: "large".to_string(),
                weights_filename: "blip-image-captioning-large-q4k.gguf".to_string(),
                weights_url: "https://huggingface.co/lmz/candle-blip/resolve/main/blip-image-captioning-large-q4k.gguf".to_string(),
                tokenizer_filename: "tokenizer-large.json".to_string(),
                tokenizer_url: "https://huggingface.co/Salesforce/blip-image-captioning-large/resolve/main/tokenizer.json".to_string(),
                size_mb: 286.0,
            },
        ]
    }

    fn select_artifact(&self, variant: &str) -> Result<ModelArtifact> {
        self.get_available_models()
            .into_iter()
            .find(|m| m.name == variant)
            .ok_or_else(|| {
                PodpisError::Config(format!(
                    "Invalid BLIP variant '{}'. Valid variants: base, large",
                    variant
                ))
            })
    }

    /// Download both artifacts of a variant if missing
    pub async fn download_artifacts(&self, artifact: &ModelArtifact) -> Result<()> {
        let weights_path = self.models_dir().join(&artifact.weights_filename);
        if !weights_path.exists() {
            self.download_file(&artifact.weights_url, &weights_path, artifact.size_mb)
                .await?;
        }

        let tokenizer_path = self.models_dir().join(&artifact.tokenizer_filename);
        if !tokenizer_path.exists() {
            self.download_file(&artifact.tokenizer_url, &tokenizer_path, TOKENIZER_SIZE_MB)
                .await?;
        }

        Ok(())
    }

    async fn download_file(&self, url: &str, local_path: &Path, size_mb: f64) -> Result<()> {
        info!("Downloading {} ({:.1} MB)...", url, size_mb);

        let pb = ProgressBar::new((size_mb * 1_000_000.0) as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );

        let response = self.client.get(url).send().await.map_err(PodpisError::Http)?;

        if !response.status().is_success() {
            return Err(PodpisError::Config(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }

        // Download to a temporary sibling first, then move into place
        let temp_path = local_path.with_extension("tmp");
        let mut file = async_fs::File::create(&temp_path).await?;

        use tokio::io::AsyncWriteExt;
        let content_length = response.content_length().unwrap_or(0);
        if content_length > 0 {
            pb.set_length(content_length);
        }

        let bytes = response.bytes().await.map_err(PodpisError::Http)?;
        file.write_all(&bytes).await?;
        pb.set_position(bytes.len() as u64);

        file.flush().await?;
        drop(file);

        async_fs::rename(&temp_path, local_path).await?;

        pb.finish_with_message(format!("Downloaded {}", local_path.display()));
        info!("Successfully downloaded {}", local_path.display());

        Ok(())
    }

    /// Get the path to the .podpis directory
    pub fn podpis_dir(&self) -> &PathBuf {
        &self.podpis_dir
    }

    /// Get the path to the models directory
    pub fn models_dir(&self) -> PathBuf {
        self.podpis_dir.join("models")
    }
}
