//! Handwriting recognition through the Hugging Face inference API

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::timeout;

use mood_core::{Error, Result, TextExtractor};

use crate::client::{api_error, request_error};
use crate::config::HfConfig;

/// Text extractor backed by a hosted image-to-text model (TrOCR by default)
pub struct HfTextExtractor {
    config: HfConfig,
    client: Client,
    current_model: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtractionResponse {
    Many(Vec<GeneratedText>),
    One(GeneratedText),
}

impl ExtractionResponse {
    fn into_text(self) -> Option<String> {
        let candidates = match self {
            ExtractionResponse::Many(items) => items,
            ExtractionResponse::One(item) => vec![item],
        };

        let mut candidates = candidates
            .into_iter()
            .map(|item| item.generated_text.trim().to_string())
            .peekable();
        let first = candidates.peek().cloned()?;
        Some(candidates.find(|text| !text.is_empty()).unwrap_or(first))
    }
}

impl HfTextExtractor {
    pub fn new(config: HfConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        let current_model = config.ocr_model.clone();

        Ok(Self {
            config,
            client,
            current_model,
        })
    }

    pub fn from_env() -> Result<Self> {
        let config = HfConfig::from_env()?;
        Self::new(config)
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.current_model = model_id.into();
        self
    }

    async fn perform_extraction(&self, image: &[u8]) -> Result<String> {
        let url = self.config.inference_endpoint(&self.current_model);

        let response = self
            .config
            .authorize(self.client.post(&url))
            .header("Accept", "application/json")
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(api_error(response, Error::Extractor).await);
        }

        let parsed: ExtractionResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        parsed.into_text().ok_or_else(|| {
            Error::Extractor(format!("Model {} returned no text", self.current_model))
        })
    }
}

#[async_trait]
impl TextExtractor for HfTextExtractor {
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
            _ => Err(api_error(response, Error::Extractor).await),
        }
    }

    async fn extract_text(&self, image: &[u8]) -> Result<String> {
        if image.is_empty() {
            return Err(Error::InvalidInput("Image is empty".to_string()));
        }

        match timeout(self.config.timeout(), self.perform_extraction(image)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout("Text extraction request timed out".to_string())),
        }
    }

    fn model_id(&self) -> &str {
        &self.current_model
    }
}
