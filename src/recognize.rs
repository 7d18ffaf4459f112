use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::caption::Captioner;
use crate::cleanup::clean_caption;
use crate::config::TranslateConfig;
use crate::error::{Result, PodpisError};
use crate::translate::{translate_best_effort, Translator};

/// Outcome of a single recognition call. Exactly one variant is ever
/// populated, so callers can render either a caption or an error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaptionResult {
    Caption { caption: String },
    Error { error: String },
}

impl CaptionResult {
    pub fn is_error(&self) -> bool {
        matches!(self, CaptionResult::Error { .. })
    }

    /// Text to display for this result: the caption or the error message
    pub fn display_text(&self) -> &str {
        match self {
            CaptionResult::Caption { caption } => caption,
            CaptionResult::Error { error } => error,
        }
    }
}

/// Recognition orchestrator: captioner, repetition cleanup, then best-effort
/// translation. Owns the lazily-initialized captioner handle for the life of
/// the process.
pub struct Recognizer {
    captioner: Box<dyn Captioner>,
    translator: Box<dyn Translator>,
    source_language: String,
    target_language: String,
    translate_enabled: bool,
}

impl Recognizer {
    pub fn new(
        captioner: Box<dyn Captioner>,
        translator: Box<dyn Translator>,
        config: &TranslateConfig,
    ) -> Self {
        let translate_enabled =
            config.enabled && config.target_language != config.source_language;

        Self {
            captioner,
            translator,
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            translate_enabled,
        }
    }

    /// Describe a single image.
    ///
    /// Never fails: every failure along the way is converted into the Error
    /// variant, so the caller always receives a complete caption or an
    /// explicit error message, never a partial result.
    pub async fn recognize(&mut self, image_path: &Path) -> CaptionResult {
        match self.recognize_inner(image_path).await {
            Ok(caption) => CaptionResult::Caption { caption },
            Err(e) => CaptionResult::Error {
                error: e.to_string(),
            },
        }
    }

    async fn recognize_inner(&mut self, image_path: &Path) -> Result<String> {
        if !image_path.is_file() {
            return Err(PodpisError::FileNotFound(image_path.display().to_string()));
        }

        let raw = self.captioner.caption(image_path).await?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PodpisError::Captioner(
                "Model produced an empty caption".to_string(),
            ));
        }

        debug!("Raw caption: {}", raw);
        let cleaned = clean_caption(raw);
        debug!("Cleaned caption: {}", cleaned);

        if self.translate_enabled {
            Ok(translate_best_effort(
                self.translator.as_ref(),
                &cleaned,
                &self.source_language,
                &self.target_language,
            )
            .await)
        } else {
            Ok(cleaned)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::translate::Translator;

    struct StubCaptioner {
        raw: &'static str,
    }

    #[async_trait]
    impl Captioner for StubCaptioner {
        async fn ensure_loaded(&mut self) -> Result<()> {
            Ok(())
        }

        async fn caption(&mut self, _image_path: &Path) -> Result<String> {
            Ok(self.raw.to_string())
        }
    }

    struct FailingCaptioner;

    #[async_trait]
    impl Captioner for FailingCaptioner {
        async fn ensure_loaded(&mut self) -> Result<()> {
            Err(PodpisError::Captioner("Failed to load model weights".to_string()))
        }

        async fn caption(&mut self, _image_path: &Path) -> Result<String> {
            self.ensure_loaded().await?;
            unreachable!()
        }
    }

    struct FailingTranslator;

    #[async_trait]
    impl Translator for FailingTranslator {
        async fn translate(&self, _: &str, _: &str, _: &str) -> Result<String> {
            Err(PodpisError::Translation("Translation API error: HTTP 500".to_string()))
        }
    }

    struct UpperTranslator;

    #[async_trait]
    impl Translator for UpperTranslator {
        async fn translate(&self, text: &str, _: &str, _: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    fn translate_config(enabled: bool) -> TranslateConfig {
        TranslateConfig {
            enabled,
            endpoint: String::new(),
            source_language: "en".to_string(),
            target_language: "ru".to_string(),
            timeout_secs: 1,
        }
    }

    fn recognizer(captioner: Box<dyn Captioner>, translate: bool) -> Recognizer {
        Recognizer::new(
            captioner,
            Box::new(FailingTranslator),
            &translate_config(translate),
        )
    }

    #[tokio::test]
    async fn recognize_cleans_degenerate_captions() {
        let image = tempfile::NamedTempFile::new().unwrap();
        let captioner = Box::new(StubCaptioner {
            raw: "a a a a dog dog running running in in park",
        });
        let mut recognizer = recognizer(captioner, false);

        let result = recognizer.recognize(image.path()).await;
        assert_eq!(
            result,
            CaptionResult::Caption {
                caption: "a dog running in park".to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_file_yields_error_result() {
        let captioner = Box::new(StubCaptioner { raw: "a cat" });
        let mut recognizer = recognizer(captioner, false);

        let result = recognizer
            .recognize(Path::new("/nonexistent/image.png"))
            .await;
        assert!(result.is_error());
        assert!(result.display_text().contains("/nonexistent/image.png"));
    }

    #[tokio::test]
    async fn captioner_failure_yields_error_result() {
        let image = tempfile::NamedTempFile::new().unwrap();
        let mut recognizer = recognizer(Box::new(FailingCaptioner), false);

        let result = recognizer.recognize(image.path()).await;
        assert!(result.is_error());
        assert!(result.display_text().contains("Failed to load model weights"));
    }

    #[tokio::test]
    async fn empty_caption_yields_error_result() {
        let image = tempfile::NamedTempFile::new().unwrap();
        let captioner = Box::new(StubCaptioner { raw: "   " });
        let mut recognizer = recognizer(captioner, false);

        let result = recognizer.recognize(image.path()).await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn translation_failure_keeps_cleaned_caption() {
        let image = tempfile::NamedTempFile::new().unwrap();
        let captioner = Box::new(StubCaptioner {
            raw: "a a a a dog dog running running in in park",
        });
        let mut recognizer = recognizer(captioner, true);

        let result = recognizer.recognize(image.path()).await;
        assert_eq!(
            result,
            CaptionResult::Caption {
                caption: "a dog running in park".to_string()
            }
        );
    }

    #[tokio::test]
    async fn translation_applies_when_enabled() {
        let image = tempfile::NamedTempFile::new().unwrap();
        let captioner = Box::new(StubCaptioner { raw: "a cat" });
        let mut recognizer = Recognizer::new(
            captioner,
            Box::new(UpperTranslator),
            &translate_config(true),
        );

        let result = recognizer.recognize(image.path()).await;
        assert_eq!(
            result,
            CaptionResult::Caption {
                caption: "A CAT".to_string()
            }
        );
    }

    #[test]
    fn caption_result_serializes_with_one_field() {
        let caption = CaptionResult::Caption {
            caption: "a cat".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&caption).unwrap(),
            r#"{"caption":"a cat"}"#
        );

        let error = CaptionResult::Error {
            error: "File not found: x.png".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"error":"File not found: x.png"}"#
        );
    }
}
