//! Mental health scoring policy

use serde::{Serialize, Serializer};
use std::fmt;

use crate::emotion::{Emotion, EmotionDistribution};

/// Coarse label attached to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentalState {
    Good,
    Moderate,
    Poor,
}

impl MentalState {
    pub fn label(self) -> &'static str {
        match self {
            MentalState::Good => "Good Mental Health",
            MentalState::Moderate => "Moderate Mental Health",
            MentalState::Poor => "Poor Mental Health - Consider seeking support",
        }
    }
}

impl fmt::Display for MentalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for MentalState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Score in `0..=100` plus its label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MentalHealthAssessment {
    pub score: u32,
    pub state: MentalState,
}

/// Constants that turn an emotion distribution into a score.
///
/// The partition, stabilizer and cutoffs have no derivation behind them; they
/// are kept together here so they can be tuned in one place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringPolicy {
    pub positive: Vec<Emotion>,
    pub negative: Vec<Emotion>,
    pub epsilon: f64,
    pub good_threshold: u32,
    pub moderate_threshold: u32,
}

impl ScoringPolicy {
    pub const POSITIVE: [Emotion; 3] = [Emotion::Joy, Emotion::Love, Emotion::Surprise];
    pub const NEGATIVE: [Emotion; 3] = [Emotion::Sadness, Emotion::Anger, Emotion::Fear];
    pub const EPSILON: f64 = 0.0001;
    pub const GOOD_THRESHOLD: u32 = 70;
    pub const MODERATE_THRESHOLD: u32 = 40;

    /// Reduce a distribution to a score and label
    pub fn assess(&self, distribution: &EmotionDistribution) -> MentalHealthAssessment {
        let score = self.score(distribution);
        MentalHealthAssessment {
            score,
            state: self.state_for(score),
        }
    }

    /// `floor(positive / (positive + negative + epsilon) * 100)`
    pub fn score(&self, distribution: &EmotionDistribution) -> u32 {
        let positive = distribution.sum_of(&self.positive);
        let negative = distribution.sum_of(&self.negative);

        let ratio = positive / (positive + negative + self.epsilon) * 100.0;
        // `as` truncates toward zero and saturates, so NaN and negatives land on 0
        (ratio as u32).min(100)
    }

    /// Thresholds are inclusive lower bounds, checked from the top
    pub fn state_for(&self, score: u32) -> MentalState {
        if score >= self.good_threshold {
            MentalState::Good
        } else if score >= self.moderate_threshold {
            MentalState::Moderate
        } else {
            MentalState::Poor
        }
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            positive: Self::POSITIVE.to_vec(),
            negative: Self::NEGATIVE.to_vec(),
            epsilon: Self::EPSILON,
            good_threshold: Self::GOOD_THRESHOLD,
            moderate_threshold: Self::MODERATE_THRESHOLD,
        }
    }
}
