// Modular translation architecture
//
// Translation is strictly best-effort: callers go through
// translate_best_effort, which falls back to the untranslated text on any
// failure so a caption is always delivered.

pub mod google;

use async_trait::async_trait;
use tracing::warn;

use crate::config::TranslateConfig;
use crate::error::Result;

/// Main trait for translation operations
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate text between the given language codes
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    pub fn create_translator(config: TranslateConfig) -> Box<dyn Translator> {
        Box::new(google::GoogleWebTranslator::new(config))
    }
}

/// Translate with fallback to the original text.
///
/// Any translator failure, including an empty translation, keeps the source
/// text unchanged. Errors never propagate out of this function.
pub async fn translate_best_effort(
    translator: &dyn Translator,
    text: &str,
    source_language: &str,
    target_language: &str,
) -> String {
    if text.is_empty() {
        return String::new();
    }

    match translator
        .translate(text, source_language, target_language)
        .await
    {
        Ok(translation) if !translation.is_empty() => translation,
        Ok(_) => {
            warn!("Empty translation received, keeping original text");
            text.to_string()
        }
        Err(e) => {
            warn!("Translation failed, keeping original text: {}", e);
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PodpisError;

    struct FailingTranslator;

    #[async_trait]
    impl Translator for FailingTranslator {
        async fn translate(&self, _: &str, _: &str, _: &str) -> Result<String> {
            Err(PodpisError::Translation("Translation API error: HTTP 500".to_string()))
        }
    }

    struct EmptyTranslator;

    #[async_trait]
    impl Translator for EmptyTranslator {
        async fn translate(&self, _: &str, _: &str, _: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    struct FixedTranslator(&'static str);

    #[async_trait]
    impl Translator for FixedTranslator {
        async fn translate(&self, _: &str, _: &str, _: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn failure_keeps_original_text() {
        let result = translate_best_effort(&FailingTranslator, "a cat", "en", "ru").await;
        assert_eq!(result, "a cat");
    }

    #[tokio::test]
    async fn empty_translation_keeps_original_text() {
        let result = translate_best_effort(&EmptyTranslator, "a cat", "en", "ru").await;
        assert_eq!(result, "a cat");
    }

    #[tokio::test]
    async fn success_returns_translation() {
        let result = translate_best_effort(&FixedTranslator("кот"), "a cat", "en", "ru").await;
        assert_eq!(result, "кот");
    }

    #[tokio::test]
    async fn empty_input_skips_translation() {
        let result = translate_best_effort(&FixedTranslator("кот"), "", "en", "ru").await;
        assert_eq!(result, "");
    }
}
