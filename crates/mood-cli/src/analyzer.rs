//! Emotion analyzer: classifier prediction to mental health report

use serde::Serialize;
use tracing::{debug, warn};

use mood_core::{
    emotion_chart, AnalysisReport, EmotionClassifier, EmotionDistribution, Error, ErrorReport,
    MentalHealthAssessment, ScoringPolicy,
};

/// The classifier model only looks at this many leading words
pub const MAX_CLASSIFIER_WORDS: usize = 512;

/// Either a report or the structured error that replaced it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Report(AnalysisReport),
    Error(ErrorReport),
}

impl AnalysisOutcome {
    /// Serialize to a single JSON line; a serialization failure becomes an error payload
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("Failed to serialize result: {}", e) }).to_string()
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AnalysisOutcome::Error(_))
    }
}

impl From<AnalysisReport> for AnalysisOutcome {
    fn from(report: AnalysisReport) -> Self {
        AnalysisOutcome::Report(report)
    }
}

impl From<Error> for AnalysisOutcome {
    fn from(error: Error) -> Self {
        AnalysisOutcome::Error(ErrorReport::new(error))
    }
}

/// Runs text through the optional classifier and the scoring policy
pub struct EmotionAnalyzer<C: EmotionClassifier> {
    classifier: Option<C>,
    policy: ScoringPolicy,
}

impl<C: EmotionClassifier> EmotionAnalyzer<C> {
    /// Create an analyzer with a connected classifier
    pub fn new(classifier: C) -> Self {
        Self::from_capability(Some(classifier))
    }

    /// Create an analyzer whose every result uses the fallback distribution
    pub fn without_classifier() -> Self {
        Self::from_capability(None)
    }

    pub fn from_capability(classifier: Option<C>) -> Self {
        Self {
            classifier,
            policy: ScoringPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Classify `text` and spread the prediction over all six emotions
    pub async fn detect_emotions(&self, text: &str) -> EmotionDistribution {
        let Some(classifier) = &self.classifier else {
            debug!("no emotion classifier loaded, using fallback distribution");
            return EmotionDistribution::FALLBACK;
        };

        let outcome = classifier.classify(&truncate_words(text, MAX_CLASSIFIER_WORDS)).await;
        match &outcome {
            Ok(prediction) if prediction.emotion().is_none() => {
                warn!(label = %prediction.label, model = classifier.model_id(), "unrecognized emotion label, using fallback distribution");
            }
            Err(e) => {
                warn!(error = %e, model = classifier.model_id(), "emotion detection failed, using fallback distribution");
            }
            Ok(_) => {}
        }

        EmotionDistribution::from_classification(&outcome)
    }

    pub fn assess(&self, distribution: &EmotionDistribution) -> MentalHealthAssessment {
        self.policy.assess(distribution)
    }

    /// Full pipeline for one piece of text
    pub async fn analyze(&self, text: &str) -> AnalysisReport {
        let emotion_scores = self.detect_emotions(text).await;
        let assessment = self.assess(&emotion_scores);

        AnalysisReport {
            extracted_text: text.to_string(),
            emotion_scores,
            mental_health_score: assessment.score,
            mental_state: assessment.state,
            emotion_chart: emotion_chart(&emotion_scores).to_string(),
        }
    }
}

/// Keep the first `max_words` whitespace-separated words, joined by single spaces
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mood_core::{Emotion, MentalState, Prediction, Result};
    use std::sync::Mutex;

    /// Classifier double that replays a fixed outcome and records its inputs
    struct ScriptedClassifier {
        outcome: fn() -> Result<Prediction>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedClassifier {
        fn new(outcome: fn() -> Result<Prediction>) -> Self {
            Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EmotionClassifier for ScriptedClassifier {
        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        async fn classify(&self, text: &str) -> Result<Prediction> {
            self.seen.lock().unwrap().push(text.to_string());
            (self.outcome)()
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn test_recognized_prediction() {
        let analyzer = EmotionAnalyzer::new(ScriptedClassifier::new(|| Ok(Prediction::new("joy", 0.9))));
        let report = analyzer.analyze("I passed my exam").await;

        assert_eq!(report.extracted_text, "I passed my exam");
        assert_eq!(report.emotion_scores.get(Emotion::Joy), 0.9);
        assert_eq!(report.mental_health_score, 93);
        assert_eq!(report.mental_state, MentalState::Good);
    }

    #[tokio::test]
    async fn test_classifier_failure_uses_fallback() {
        let analyzer = EmotionAnalyzer::new(ScriptedClassifier::new(|| {
            Err(Error::Network("connection reset".to_string()))
        }));
        let report = analyzer.analyze("anything").await;

        assert_eq!(report.emotion_scores, EmotionDistribution::FALLBACK);
        assert_eq!(report.mental_health_score, 39);
        assert_eq!(report.mental_state, MentalState::Poor);
    }

    #[tokio::test]
    async fn test_unrecognized_label_uses_fallback() {
        let analyzer = EmotionAnalyzer::new(ScriptedClassifier::new(|| Ok(Prediction::new("neutral", 0.8))));

        assert_eq!(analyzer.detect_emotions("meh").await, EmotionDistribution::FALLBACK);
    }

    #[tokio::test]
    async fn test_missing_classifier_uses_fallback() {
        let analyzer = EmotionAnalyzer::<ScriptedClassifier>::without_classifier();

        assert!(!analyzer.has_classifier());
        assert_eq!(analyzer.detect_emotions("hello").await, EmotionDistribution::FALLBACK);
    }

    #[tokio::test]
    async fn test_long_text_is_truncated_before_classification() {
        let classifier = ScriptedClassifier::new(|| Ok(Prediction::new("fear", 0.5)));
        let analyzer = EmotionAnalyzer::new(classifier);
        let text = vec!["word"; 600].join("  ");

        let report = analyzer.analyze(&text).await;
        assert_eq!(report.extracted_text, text);

        let seen = analyzer.classifier.as_ref().unwrap().seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].split(' ').count(), MAX_CLASSIFIER_WORDS);
    }

    #[tokio::test]
    async fn test_custom_policy() {
        let policy = ScoringPolicy {
            good_threshold: 95,
            ..ScoringPolicy::default()
        };
        let analyzer = EmotionAnalyzer::new(ScriptedClassifier::new(|| Ok(Prediction::new("joy", 0.9))))
            .with_policy(policy);

        assert_eq!(analyzer.analyze("fine").await.mental_state, MentalState::Moderate);
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("  a   b\tc\nd ", 3), "a b c");
        assert_eq!(truncate_words("", 3), "");
    }

    #[test]
    fn test_outcome_json() {
        let outcome = AnalysisOutcome::from(Error::InvalidInput("no text".to_string()));

        assert!(outcome.is_error());
        assert_eq!(outcome.to_json(), r#"{"error":"Invalid input: no text"}"#);
    }
}
