//! Hugging Face configuration

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use mood_core::{Error, Result};

/// Configuration for the Hugging Face inference and hub clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HfConfig {
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
    pub inference_url: String,
    pub hub_url: String,
    pub emotion_model: String,
    pub ocr_model: String,
    pub models_dir: PathBuf,
    pub timeout_secs: u64,
}

impl HfConfig {
    pub const DEFAULT_INFERENCE_URL: &'static str = "https://api-inference.huggingface.co";
    pub const DEFAULT_HUB_URL: &'static str = "https://huggingface.co";
    pub const EMOTION_MODEL: &'static str = "bhadresh-savani/bert-base-uncased-emotion";
    pub const OCR_MODEL: &'static str = "microsoft/trocr-base-handwritten";
    pub const DEFAULT_MODELS_DIR: &'static str = "./models";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_token = non_empty("HF_API_TOKEN").or_else(|| non_empty("HUGGINGFACEHUB_API_TOKEN"));

        let inference_url = non_empty("HF_INFERENCE_URL")
            .unwrap_or_else(|| Self::DEFAULT_INFERENCE_URL.to_string());
        let hub_url = non_empty("HF_HUB_URL").unwrap_or_else(|| Self::DEFAULT_HUB_URL.to_string());

        let emotion_model =
            non_empty("EMOTION_MODEL").unwrap_or_else(|| Self::EMOTION_MODEL.to_string());
        let ocr_model = non_empty("OCR_MODEL").unwrap_or_else(|| Self::OCR_MODEL.to_string());

        let models_dir = non_empty("MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_MODELS_DIR));

        let timeout_secs = match non_empty("HF_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Configuration(format!("HF_TIMEOUT_SECS must be a whole number of seconds, got '{}'", raw))
            })?,
            None => Self::DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            api_token,
            inference_url,
            hub_url,
            emotion_model,
            ocr_model,
            models_dir,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration with default endpoints and models
    pub fn new(api_token: Option<String>) -> Self {
        Self {
            api_token,
            inference_url: Self::DEFAULT_INFERENCE_URL.to_string(),
            hub_url: Self::DEFAULT_HUB_URL.to_string(),
            emotion_model: Self::EMOTION_MODEL.to_string(),
            ocr_model: Self::OCR_MODEL.to_string(),
            models_dir: PathBuf::from(Self::DEFAULT_MODELS_DIR),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Point both inference and hub requests at a single base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.inference_url = base_url.clone();
        self.hub_url = base_url;
        self
    }

    pub fn with_models_dir(mut self, models_dir: impl Into<PathBuf>) -> Self {
        self.models_dir = models_dir.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that both endpoints are absolute http(s) URLs
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("HF_INFERENCE_URL", &self.inference_url), ("HF_HUB_URL", &self.hub_url)] {
            let url = Url::parse(value)
                .map_err(|e| Error::Configuration(format!("{} is not a valid URL ({}): {}", name, value, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Configuration(format!(
                    "{} must use http or https, got '{}'",
                    name,
                    url.scheme()
                )));
            }
        }
        Ok(())
    }

    /// `{inference_url}/models/{model_id}`
    pub(crate) fn inference_endpoint(&self, model_id: &str) -> String {
        format!("{}/models/{}", self.inference_url.trim_end_matches('/'), model_id)
    }

    /// `{hub_url}/api/models/{model_id}`
    pub(crate) fn model_info_endpoint(&self, model_id: &str) -> String {
        format!("{}/api/models/{}", self.hub_url.trim_end_matches('/'), model_id)
    }

    /// `{hub_url}/{model_id}/resolve/main/{file}`
    pub(crate) fn file_endpoint(&self, model_id: &str, file: &str) -> String {
        format!("{}/{}/resolve/main/{}", self.hub_url.trim_end_matches('/'), model_id, file)
    }

    /// Attach the bearer token, when one is configured
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl Default for HfConfig {
    fn default() -> Self {
        Self::new(None)
    }
}
