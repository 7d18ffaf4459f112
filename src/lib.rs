//! Podpis - Batch Image Captioning Workflow
//!
//! A Rust implementation of a batch image captioning workflow that describes
//! image files with a BLIP model, removes decoder repetition artifacts from
//! the raw captions, and translates the result on a best-effort basis.

pub mod cli;
pub mod config;
pub mod workflow;
pub mod caption;
pub mod cleanup;
pub mod recognize;
pub mod translate;
pub mod error;
pub mod setup;
