//! Analysis output types

use serde::{Deserialize, Serialize};

use crate::emotion::EmotionDistribution;
use crate::scoring::MentalState;

/// 1x1 transparent PNG returned in place of a rendered emotion chart
pub const PLACEHOLDER_CHART: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+P+/HgAFdwI2QOQvhAAAAABJRU5ErkJggg==";

/// Chart image for a distribution, as a data URI.
///
/// Charts are rendered client side; this always returns [`PLACEHOLDER_CHART`].
pub fn emotion_chart(_distribution: &EmotionDistribution) -> &'static str {
    PLACEHOLDER_CHART
}

/// Full result of analyzing one piece of text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub extracted_text: String,
    pub emotion_scores: EmotionDistribution,
    pub mental_health_score: u32,
    pub mental_state: MentalState,
    pub emotion_chart: String,
}

/// Structured failure returned instead of an [`AnalysisReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: String,
}

impl ErrorReport {
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}
