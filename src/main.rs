//! Podpis - Batch Image Captioning Workflow
//!
//! This is the main entry point for the podpis application, which captions
//! image files with a BLIP model, cleans up decoder repetition artifacts,
//! and translates the captions on a best-effort basis.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use podpis::cli::{Args, Commands};
use podpis::config::Config;
use podpis::recognize::CaptionResult;
use podpis::setup::SetupManager;
use podpis::workflow::{print_results_table, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    let setup_manager = SetupManager::new()?;

    // Execute command
    match args.command {
        Commands::Models { download } => {
            info!("Listing available BLIP models...");

            let models = setup_manager.get_available_models();
            println!("\nAvailable BLIP Models:");
            println!(
                "{:<10} {:<45} {:<10} {:<10}",
                "Variant", "Weights", "Size (MB)", "Status"
            );
            println!("{}", "-".repeat(80));

            let models_dir = setup_manager.models_dir();
            for model in &models {
                let local_path = models_dir.join(&model.weights_filename);
                let status = if local_path.exists() {
                    "Downloaded"
                } else {
                    "Missing"
                };

                println!(
                    "{:<10} {:<45} {:<10.1} {:<10}",
                    model.name, model.weights_filename, model.size_mb, status
                );
            }

            if download {
                info!("Downloading all missing model files...");
                for model in &models {
                    setup_manager.download_artifacts(model).await?;
                }
                info!("All model files downloaded successfully");
            }
        }
        Commands::Caption {
            input,
            target_lang,
            no_translate,
        } => {
            info!("Captioning image file: {}", input.display());

            apply_translation_flags(&mut config, target_lang, no_translate);
            setup_manager.initialize(&mut config).await?;

            let mut workflow = Workflow::new(config);
            match workflow.caption_file(&input).await {
                CaptionResult::Caption { caption } => println!("{}", caption),
                CaptionResult::Error { error } => return Err(anyhow::anyhow!(error)),
            }
        }
        Commands::Batch {
            input_dir,
            target_lang,
            no_translate,
            report,
        } => {
            info!("Processing directory: {}", input_dir.display());

            apply_translation_flags(&mut config, target_lang, no_translate);
            setup_manager.initialize(&mut config).await?;

            let mut workflow = Workflow::new(config);
            let results = workflow
                .caption_directory(&input_dir, report.as_deref())
                .await?;
            print_results_table(&results);
        }
    }

    info!("podpis completed successfully");
    Ok(())
}

/// Apply CLI translation overrides to the loaded configuration
fn apply_translation_flags(config: &mut Config, target_lang: Option<String>, no_translate: bool) {
    if let Some(lang) = target_lang {
        config.translate.target_language = lang;
    }
    if no_translate {
        config.translate.enabled = false;
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let podpis_dir = std::env::current_dir()?.join(".podpis");
    let log_dir = podpis_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "podpis.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
