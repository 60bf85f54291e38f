//! Emotion categories and the per-call emotion distribution

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

use crate::classifier::Prediction;
use crate::Result;

/// The closed set of emotions the classifier model is trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Love,
    Surprise,
}

impl Emotion {
    /// All categories, in serialization order
    pub const ALL: [Emotion; 6] = [
        Emotion::Joy,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Love,
        Emotion::Surprise,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Love => "love",
            Emotion::Surprise => "surprise",
        }
    }

    /// Parse a classifier label. Returns `None` for anything outside the six categories.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|emotion| emotion.as_str().eq_ignore_ascii_case(label))
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Emotion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Weights for all six emotions.
///
/// Built fresh for every analysis, either from a single classifier prediction
/// (the predicted emotion keeps its confidence, the rest share the remainder)
/// or from the fixed fallback when no usable prediction exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionDistribution {
    weights: [f64; 6],
}

impl EmotionDistribution {
    /// Used whenever the classifier is unavailable, fails, or predicts an unknown label
    pub const FALLBACK: EmotionDistribution = EmotionDistribution {
        weights: [0.2, 0.2, 0.2, 0.2, 0.1, 0.1],
    };

    /// A distribution with every weight at zero
    pub const fn zero() -> Self {
        Self { weights: [0.0; 6] }
    }

    pub const fn fallback() -> Self {
        Self::FALLBACK
    }

    /// Give `emotion` the confidence and split `1 - confidence` evenly across the other five.
    ///
    /// Confidence is clamped into `[0, 1]`; NaN is treated as `0`.
    pub fn from_prediction(emotion: Emotion, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        let others = (Emotion::ALL.len() - 1) as f64;
        let share = (1.0 - confidence) / others;

        let mut weights = [share; 6];
        weights[emotion.index()] = confidence;
        Self { weights }
    }

    /// Normalize a classifier outcome into a full distribution.
    ///
    /// `Err` and unrecognized labels select [`EmotionDistribution::FALLBACK`].
    pub fn from_classification(outcome: &Result<Prediction>) -> Self {
        match outcome {
            Ok(prediction) => match prediction.emotion() {
                Some(emotion) => Self::from_prediction(emotion, prediction.score),
                None => Self::FALLBACK,
            },
            Err(_) => Self::FALLBACK,
        }
    }

    /// Replace a single weight
    pub fn with(mut self, emotion: Emotion, weight: f64) -> Self {
        self.weights[emotion.index()] = weight;
        self
    }

    pub fn get(&self, emotion: Emotion) -> f64 {
        self.weights[emotion.index()]
    }

    /// Sum of the weights for the given emotions
    pub fn sum_of(&self, emotions: &[Emotion]) -> f64 {
        emotions.iter().map(|emotion| self.get(*emotion)).sum()
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        Emotion::ALL
            .into_iter()
            .map(move |emotion| (emotion, self.get(emotion)))
    }
}

impl Default for EmotionDistribution {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl Serialize for EmotionDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Emotion::ALL.len()))?;
        for (emotion, weight) in self.iter() {
            map.serialize_entry(emotion.as_str(), &weight)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_label_parsing() {
        assert_eq!(Emotion::from_label("joy"), Some(Emotion::Joy));
        assert_eq!(Emotion::from_label(" Sadness "), Some(Emotion::Sadness));
        assert_eq!(Emotion::from_label("SURPRISE"), Some(Emotion::Surprise));
        assert_eq!(Emotion::from_label("neutral"), None);
        assert_eq!(Emotion::from_label(""), None);
    }

    #[test]
    fn test_prediction_distributes_remainder_evenly() {
        for emotion in Emotion::ALL {
            for step in 0..=20 {
                let confidence = step as f64 / 20.0;
                let distribution = EmotionDistribution::from_prediction(emotion, confidence);

                assert!((distribution.total() - 1.0).abs() < TOLERANCE);
                assert_eq!(distribution.get(emotion), confidence);

                let others: Vec<f64> = distribution
                    .iter()
                    .filter(|(other, _)| *other != emotion)
                    .map(|(_, weight)| weight)
                    .collect();
                assert_eq!(others.len(), 5);
                assert!(others.iter().all(|weight| *weight == others[0]));
            }
        }
    }

    #[test]
    fn test_joy_prediction() {
        let distribution = EmotionDistribution::from_prediction(Emotion::Joy, 0.9);

        assert_eq!(distribution.get(Emotion::Joy), 0.9);
        for emotion in [Emotion::Sadness, Emotion::Anger, Emotion::Fear, Emotion::Love, Emotion::Surprise] {
            assert!((distribution.get(emotion) - 0.02).abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_full_confidence_zeroes_the_rest() {
        let distribution = EmotionDistribution::from_prediction(Emotion::Fear, 1.0);

        assert_eq!(distribution.get(Emotion::Fear), 1.0);
        assert!(distribution
            .iter()
            .filter(|(emotion, _)| *emotion != Emotion::Fear)
            .all(|(_, weight)| weight == 0.0));
    }

    #[test]
    fn test_out_of_range_confidence_is_clamped() {
        let high = EmotionDistribution::from_prediction(Emotion::Love, 1.7);
        assert_eq!(high.get(Emotion::Love), 1.0);

        let low = EmotionDistribution::from_prediction(Emotion::Love, -0.3);
        assert_eq!(low.get(Emotion::Love), 0.0);
        assert!((low.get(Emotion::Joy) - 0.2).abs() < TOLERANCE);

        let nan = EmotionDistribution::from_prediction(Emotion::Love, f64::NAN);
        assert_eq!(nan.get(Emotion::Love), 0.0);
    }

    #[test]
    fn test_classification_outcomes() {
        let recognized = Ok(Prediction::new("anger", 0.6));
        let distribution = EmotionDistribution::from_classification(&recognized);
        assert_eq!(distribution.get(Emotion::Anger), 0.6);

        let unrecognized = Ok(Prediction::new("neutral", 0.99));
        assert_eq!(
            EmotionDistribution::from_classification(&unrecognized),
            EmotionDistribution::FALLBACK
        );

        let failed: Result<Prediction> = Err(Error::Classifier("model is loading".to_string()));
        assert_eq!(
            EmotionDistribution::from_classification(&failed),
            EmotionDistribution::FALLBACK
        );
    }

    #[test]
    fn test_fallback_sums_to_one() {
        assert!((EmotionDistribution::FALLBACK.total() - 1.0).abs() < TOLERANCE);
        assert_eq!(EmotionDistribution::default(), EmotionDistribution::fallback());
    }

    #[test]
    fn test_serializes_in_fixed_order() {
        let json = serde_json::to_string(&EmotionDistribution::FALLBACK).unwrap();
        assert_eq!(
            json,
            r#"{"joy":0.2,"sadness":0.2,"anger":0.2,"fear":0.2,"love":0.1,"surprise":0.1}"#
        );
    }
}
