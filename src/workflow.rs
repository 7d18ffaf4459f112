use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::caption::CaptionerFactory;
use crate::config::Config;
use crate::error::{Result, PodpisError};
use crate::recognize::{CaptionResult, Recognizer};
use crate::translate::TranslatorFactory;

/// One row of a batch run: an image and what recognition produced for it
#[derive(Debug, Clone, Serialize)]
pub struct ImageResult {
    pub image_path: PathBuf,
    #[serde(flatten)]
    pub result: CaptionResult,
}

pub struct Workflow {
    config: Config,
    recognizer: Recognizer,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        let captioner = CaptionerFactory::create_captioner(config.captioner.clone());
        let translator = TranslatorFactory::create_translator(config.translate.clone());
        let recognizer = Recognizer::new(captioner, translator, &config.translate);

        Self { config, recognizer }
    }

    /// Caption a single image file
    pub async fn caption_file<P: AsRef<Path>>(&mut self, input_path: P) -> CaptionResult {
        let input_path = input_path.as_ref();
        info!("Captioning file: {}", input_path.display());

        if !self.is_supported_image(input_path) {
            return CaptionResult::Error {
                error: PodpisError::UnsupportedFormat(input_path.display().to_string())
                    .to_string(),
            };
        }

        self.recognizer.recognize(input_path).await
    }

    fn is_supported_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.config
                    .scan
                    .extensions
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Caption all images in a directory, one image at a time.
    ///
    /// A failure on one image is recorded as that image's result and never
    /// aborts the rest of the batch.
    pub async fn caption_directory<P: AsRef<Path>>(
        &mut self,
        input_dir: P,
        report_path: Option<&Path>,
    ) -> Result<Vec<ImageResult>> {
        let input_dir = input_dir.as_ref();
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(PodpisError::Config(
                "Input path is not a directory".to_string(),
            ));
        }

        let image_files = self.find_image_files(input_dir);
        if image_files.is_empty() {
            return Err(PodpisError::FileNotFound(format!(
                "No images found in {}",
                input_dir.display()
            )));
        }

        info!("Found {} image files to process", image_files.len());

        let pb = ProgressBar::new(image_files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );

        let mut results = Vec::with_capacity(image_files.len());
        for image_path in image_files {
            pb.set_message(
                image_path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string(),
            );

            let result = self.recognizer.recognize(&image_path).await;
            if let CaptionResult::Error { error } = &result {
                warn!("Failed to caption {}: {}", image_path.display(), error);
            }

            results.push(ImageResult { image_path, result });
            pb.inc(1);
        }
        pb.finish_and_clear();

        if let Some(report_path) = report_path {
            self.write_report(&results, report_path).await?;
        }

        Ok(results)
    }

    /// Find image files by configured extension, sorted and de-duplicated
    fn find_image_files(&self, input_dir: &Path) -> Vec<PathBuf> {
        let max_depth = if self.config.scan.recursive {
            usize::MAX
        } else {
            1
        };

        let mut image_files = Vec::new();
        for entry in WalkDir::new(input_dir)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(extension) = entry.path().extension() {
                if let Some(ext_str) = extension.to_str() {
                    if self
                        .config
                        .scan
                        .extensions
                        .iter()
                        .any(|e| e.eq_ignore_ascii_case(ext_str))
                    {
                        image_files.push(entry.path().to_path_buf());
                    }
                }
            }
        }

        image_files.sort();
        image_files.dedup();
        image_files
    }

    async fn write_report(&self, results: &[ImageResult], report_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(results)?;
        fs::write(report_path, content).await?;
        info!("Report written to {}", report_path.display());
        Ok(())
    }
}

/// Print batch results as an aligned table
pub fn print_results_table(results: &[ImageResult]) {
    println!("\nCaption results ({} images):", results.len());
    println!("{:<40} {:<60}", "Image", "Description");
    println!("{}", "-".repeat(100));

    for row in results {
        let file_name = row
            .image_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy();
        let description = match &row.result {
            CaptionResult::Caption { caption } => caption.clone(),
            CaptionResult::Error { error } => format!("Error: {}", error),
        };

        println!("{:<40} {:<60}", file_name, description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace(recursive: bool) -> (tempfile::TempDir, Workflow) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("a.PNG"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("nested").join("c.jpeg"), b"x").unwrap();

        let mut config = Config::default();
        config.scan.recursive = recursive;
        (dir, Workflow::new(config))
    }

    #[test]
    fn scan_finds_images_case_insensitively() {
        let (dir, workflow) = workspace(true);
        let files = workflow.find_image_files(dir.path());

        assert_eq!(files.len(), 3);
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
        assert!(files.iter().any(|p| p.ends_with("a.PNG")));
        assert!(files.iter().any(|p| p.ends_with("b.jpg")));
        assert!(files.iter().any(|p| p.ends_with("nested/c.jpeg")));
    }

    #[test]
    fn non_recursive_scan_skips_subdirectories() {
        let (dir, workflow) = workspace(false);
        let files = workflow.find_image_files(dir.path());

        assert_eq!(files.len(), 2);
        assert!(!files.iter().any(|p| p.ends_with("c.jpeg")));
    }

    #[tokio::test]
    async fn unsupported_format_yields_error_result() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, b"not an image").unwrap();

        let mut workflow = Workflow::new(Config::default());
        let result = workflow.caption_file(&notes).await;

        assert!(result.is_error());
        assert!(result.display_text().contains("Unsupported format"));
    }

    #[test]
    fn image_result_serializes_flat() {
        let row = ImageResult {
            image_path: PathBuf::from("cat.png"),
            result: CaptionResult::Caption {
                caption: "a cat".to_string(),
            },
        };

        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["image_path"], "cat.png");
        assert_eq!(value["caption"], "a cat");
    }
}
