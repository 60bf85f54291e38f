//! Hugging Face emotion classifier client

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use mood_core::{EmotionClassifier, Error, Prediction, Result};

use crate::config::HfConfig;

/// Emotion classifier backed by the Hugging Face inference API
pub struct HfEmotionClassifier {
    config: HfConfig,
    client: Client,
    current_model: String,
}

#[derive(Serialize)]
struct ClassificationRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabelScore {
    label: String,
    score: f64,
}

/// Text-classification pipelines answer with one list per input, but some
/// deployments flatten the single-input case.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ClassificationResponse {
    Batched(Vec<Vec<LabelScore>>),
    Single(Vec<LabelScore>),
}

impl ClassificationResponse {
    /// Highest scoring label across the response
    pub(crate) fn top(self) -> Option<Prediction> {
        let scores = match self {
            ClassificationResponse::Batched(batches) => batches.into_iter().flatten().collect(),
            ClassificationResponse::Single(scores) => scores,
        };

        scores
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(|best| Prediction::new(best.label, best.score))
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Build an error from a non-success response, preferring the API's own message
pub(crate) async fn api_error(response: Response, wrap: fn(String) -> Error) -> Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let detail = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|parsed| parsed.error)
        .unwrap_or(body);

    wrap(format!("Hugging Face API request failed with status {}: {}", status, detail))
}

/// Map a failed send; timeouts keep their own variant
pub(crate) fn request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout(error.to_string())
    } else {
        Error::Network(error.to_string())
    }
}

impl HfEmotionClassifier {
    /// Create a new classifier from configuration
    pub fn new(config: HfConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        let current_model = config.emotion_model.clone();

        Ok(Self {
            config,
            client,
            current_model,
        })
    }

    /// Create a new classifier from environment variables
    pub fn from_env() -> Result<Self> {
        let config = HfConfig::from_env()?;
        Self::new(config)
    }

    /// Set the model to use for classification
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.current_model = model_id.into();
        self
    }

    async fn perform_classification(&self, text: &str) -> Result<Prediction> {
        let url = self.config.inference_endpoint(&self.current_model);

        let response = self
            .config
            .authorize(self.client.post(&url))
            .header("Accept", "application/json")
            .json(&ClassificationRequest { inputs: text })
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(api_error(response, Error::Classifier).await);
        }

        let parsed: ClassificationResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        parsed.top().ok_or_else(|| {
            Error::Classifier(format!("Empty classification from model {}", self.current_model))
        })
    }
}

#[async_trait]
impl EmotionClassifier for HfEmotionClassifier {
    async fn connect(&mut self) -> Result<()> {
        let url = self.config.model_info_endpoint(&self.current_model);

        let response = self
            .config
            .authorize(self.client.get(&url))
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(Error::Configuration(format!(
                "Model {} was not found on the hub",
                self.current_model
            ))),
            _ => Err(api_error(response, Error::Classifier).await),
        }
    }

    async fn classify(&self, text: &str) -> Result<Prediction> {
        match timeout(self.config.timeout(), self.perform_classification(text)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout("Classification request timed out".to_string())),
        }
    }

    fn model_id(&self) -> &str {
        &self.current_model
    }
}
