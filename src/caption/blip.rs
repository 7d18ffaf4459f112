use std::path::Path;

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::blip::VisionConfig;
use candle_transformers::models::quantized_blip;
use candle_transformers::models::{blip, blip_text};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::config::CaptionerConfig;
use crate::error::{Result, PodpisError};
use super::Captioner;

const SEP_TOKEN_ID: u32 = 102;
const BOS_TOKEN_ID: u32 = 30522;
const IMAGE_SIZE: usize = 384;

fn base_config() -> blip::Config {
    let text_config = blip_text::Config {
        vocab_size: 30524,
        hidden_size: 768,
        encoder_hidden_size: 768,
        intermediate_size: 3072,
        projection_dim: 768,
        num_hidden_layers: 12,
        num_attention_heads: 12,
        max_position_embeddings: 512,
        hidden_act: candle_nn::Activation::Gelu,
        layer_norm_eps: 1e-12,
        is_decoder: true,
    };
    let vision_config = VisionConfig {
        hidden_size: 768,
        intermediate_size: 3072,
        projection_dim: 512,
        num_hidden_layers: 12,
        num_attention_heads: 12,
        image_size: 384,
        patch_size: 16,
        hidden_act: candle_nn::Activation::Gelu,
        layer_norm_eps: 1e-5,
    };

    blip::Config {
        text_config,
        vision_config,
        projection_dim: 512,
        image_text_hidden_size: 256,
    }
}

/// Loaded model state, created at most once per process and reused.
struct BlipModel {
    tokenizer: Tokenizer,
    model: quantized_blip::BlipForConditionalGeneration,
    logits_processor: LogitsProcessor,
    device: Device,
}

/// Local BLIP captioner with lazily-loaded quantized weights
pub struct BlipCaptioner {
    config: CaptionerConfig,
    model: Option<BlipModel>,
}

impl BlipCaptioner {
    pub fn new(config: CaptionerConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    fn load_model(&self) -> Result<BlipModel> {
        info!("Loading BLIP {} model from {}", self.config.variant, self.config.model);

        let tokenizer = Tokenizer::from_file(&self.config.tokenizer)
            .map_err(|_| PodpisError::Captioner("Failed to initialize tokenizer".to_string()))?;

        let logits_processor = LogitsProcessor::new(self.config.seed, None, None);

        let model_config = match self.config.variant.as_str() {
            "base" => base_config(),
            "large" => blip::Config::image_captioning_large(),
            other => {
                return Err(PodpisError::Config(format!(
                    "Invalid BLIP variant '{}'. Valid variants: base, large",
                    other
                )));
            }
        };

        let device = Device::Cpu;

        let vb = quantized_blip::VarBuilder::from_gguf(&self.config.model, &device)
            .map_err(|e| PodpisError::Captioner(format!("Failed to load model weights: {}", e)))?;
        let model = quantized_blip::BlipForConditionalGeneration::new(&model_config, vb)
            .map_err(|e| PodpisError::Captioner(format!("Failed to build BLIP model: {}", e)))?;

        Ok(BlipModel {
            tokenizer,
            model,
            logits_processor,
            device,
        })
    }
}

#[async_trait]
impl Captioner for BlipCaptioner {
    async fn ensure_loaded(&mut self) -> Result<()> {
        if self.model.is_none() {
            self.model = Some(self.load_model()?);
        }
        Ok(())
    }

    async fn caption(&mut self, image_path: &Path) -> Result<String> {
        self.ensure_loaded().await?;

        let max_length = self.config.max_length;
        match self.model.as_mut() {
            Some(state) => state.generate(image_path, max_length),
            None => Err(PodpisError::Captioner("BLIP model not loaded".to_string())),
        }
    }
}

impl BlipModel {
    fn generate(&mut self, image_path: &Path, max_length: usize) -> Result<String> {
        debug!("Generating caption for image: {}", image_path.display());

        let image = self.load_image(image_path)?.to_device(&self.device)?;
        let image_embeds = image.unsqueeze(0)?.apply(self.model.vision_model())?;

        let mut token_ids = vec![BOS_TOKEN_ID];

        // required for repeated generation with the same handle
        self.model.text_decoder().reset_kv_cache();

        for index in 0..max_length {
            let context_size = if index > 0 { 1 } else { token_ids.len() };
            let start_pos = token_ids.len().saturating_sub(context_size);
            let input_ids = Tensor::new(&token_ids[start_pos..], &self.device)?.unsqueeze(0)?;
            let logits = self.model.text_decoder().forward(&input_ids, &image_embeds)?;
            let logits = logits.squeeze(0)?;
            let logits = logits.get(logits.dim(0)? - 1)?;
            let token = self.logits_processor.sample(&logits)?;
            if token == SEP_TOKEN_ID {
                break;
            }
            token_ids.push(token);
        }

        self.tokenizer
            .decode(&token_ids, true)
            .map_err(|_| PodpisError::Captioner("Failed to decode generated tokens".to_string()))
    }

    /// Decode the image to a normalized 384x384 RGB tensor
    fn load_image(&self, image_path: &Path) -> Result<Tensor> {
        let data = std::fs::read(image_path)?;
        let img = image::ImageReader::new(std::io::Cursor::new(data))
            .with_guessed_format()?
            .decode()?
            .resize_to_fill(
                IMAGE_SIZE as u32,
                IMAGE_SIZE as u32,
                image::imageops::FilterType::Triangle,
            );
        let img = img.to_rgb8();
        let data = img.into_raw();
        let data =
            Tensor::from_vec(data, (IMAGE_SIZE, IMAGE_SIZE, 3), &Device::Cpu)?.permute((2, 0, 1))?;
        let mean = Tensor::new(&[0.48145466f32, 0.4578275, 0.40821073], &Device::Cpu)?
            .reshape((3, 1, 1))?;
        let std = Tensor::new(&[0.26862954f32, 0.261_302_6, 0.275_777_1], &Device::Cpu)?
            .reshape((3, 1, 1))?;
        let normalized = (data.to_dtype(candle_core::DType::F32)? / 255.)?
            .broadcast_sub(&mean)?
            .broadcast_div(&std)?;

        Ok(normalized)
    }
}
