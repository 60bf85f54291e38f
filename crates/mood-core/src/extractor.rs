//! Handwriting text extractor trait

use async_trait::async_trait;

use crate::Result;

/// Trait for optical text extractors (e.g., a hosted TrOCR model)
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Verify the backing model is reachable
    async fn connect(&mut self) -> Result<()>;

    /// Recognize the text in an encoded image (PNG, JPEG, ...)
    async fn extract_text(&self, image: &[u8]) -> Result<String>;

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}
