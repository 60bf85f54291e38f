//! Hugging Face integration for Mood Lens
//!
//! This crate provides the hosted-model implementations of the
//! `EmotionClassifier` and `TextExtractor` traits, plus the model downloader.

mod client;
mod config;
mod hub;
mod ocr;


pub use client::HfEmotionClassifier;
pub use config::HfConfig;
pub use hub::{model_directory, validate_model_id, DownloadSummary, ModelDownloader};
pub use ocr::HfTextExtractor;

// Re-export core types for convenience
pub use mood_core::{EmotionClassifier, Error, Prediction, Result, TextExtractor};
