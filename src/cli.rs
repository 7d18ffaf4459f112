use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Caption a single image file
    Caption {
        /// Input image file
        #[arg(short, long)]
        input: PathBuf,

        /// Target language for translation
        #[arg(short, long)]
        target_lang: Option<String>,

        /// Skip translation and keep the English caption
        #[arg(long)]
        no_translate: bool,
    },

    /// Caption all images in a directory
    Batch {
        /// Input directory containing image files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Target language for translation
        #[arg(short, long)]
        target_lang: Option<String>,

        /// Skip translation and keep the English captions
        #[arg(long)]
        no_translate: bool,

        /// Write all results to a JSON report file
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// List available BLIP models and their status
    Models {
        /// Download all missing model files
        #[arg(long)]
        download: bool,
    },
}
