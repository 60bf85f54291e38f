//! Emotion classifier trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::emotion::Emotion;
use crate::Result;

/// Top prediction returned by an emotion classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }

    /// The predicted emotion, if the label is one of the six known categories
    pub fn emotion(&self) -> Option<Emotion> {
        Emotion::from_label(&self.label)
    }
}

/// Trait for text emotion classifiers (e.g., a hosted BERT emotion model)
///
/// Implementations are constructed once at startup. A classifier that cannot
/// be connected is simply not handed to the analyzer, so callers never see a
/// half-initialized instance.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Verify the backing model is reachable
    async fn connect(&mut self) -> Result<()>;

    /// Classify `text` and return the single most likely label
    async fn classify(&self, text: &str) -> Result<Prediction>;

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}
