// Modular captioning architecture
//
// This module provides different captioner implementations through a factory
// pattern:
// - Blip: local BLIP inference via candle
// - Endpoint: remote OpenAI-compatible vision endpoint
//
// To add a new captioning service:
// 1. Implement the Captioner trait for your service
// 2. Add the service to the CaptionerBackend config enum
// 3. Update the factory to create your implementation

pub mod blip;
pub mod endpoint;

use async_trait::async_trait;
use std::path::Path;

use crate::config::{CaptionerBackend, CaptionerConfig};
use crate::error::Result;

/// Main trait for captioning operations
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Load model resources. Idempotent; a second call while already loaded
    /// is a no-op. Called implicitly by caption.
    async fn ensure_loaded(&mut self) -> Result<()>;

    /// Generate a raw caption for an image file
    async fn caption(&mut self, image_path: &Path) -> Result<String>;
}

/// Factory for creating captioner instances
pub struct CaptionerFactory;

impl CaptionerFactory {
    /// Create a captioner based on the configured backend
    pub fn create_captioner(config: CaptionerConfig) -> Box<dyn Captioner> {
        match config.backend {
            CaptionerBackend::Blip => Box::new(blip::BlipCaptioner::new(config)),
            CaptionerBackend::Endpoint => Box::new(endpoint::EndpointCaptioner::new(config)),
        }
    }
}
