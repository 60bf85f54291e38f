//! Core traits and types for Mood Lens
//!
//! This crate defines the emotion classifier and text extractor capabilities,
//! the six-way emotion distribution built from a classifier prediction, and the
//! scoring policy that reduces that distribution to a mental health score.

pub mod classifier;
pub mod emotion;
pub mod error;
pub mod extractor;
pub mod report;
pub mod scoring;


pub use classifier::{EmotionClassifier, Prediction};
pub use emotion::{Emotion, EmotionDistribution};
pub use error::{Error, Result};
pub use extractor::TextExtractor;
pub use report::{emotion_chart, AnalysisReport, ErrorReport, PLACEHOLDER_CHART};
pub use scoring::{MentalHealthAssessment, MentalState, ScoringPolicy};
