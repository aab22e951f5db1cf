use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ApiError;

/// Language hints every recognition request must carry for bilingual exchange screens
pub const DEFAULT_RECOGNITION_LANGUAGES: [&str; 2] = ["zh-Hans", "en-US"];

/// A single image handed to the recognition engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionRequest {
    pub image: Vec<u8>,
    /// BCP-47 language hints, most preferred first
    pub languages: Vec<String>,
}

impl RecognitionRequest {
    pub fn new(image: Vec<u8>, languages: &[String]) -> Self {
        let mut hints: Vec<String> = languages.to_vec();
        for lang in DEFAULT_RECOGNITION_LANGUAGES {
            if !hints.iter().any(|h| h == lang) {
                hints.push(lang.to_string());
            }
        }
        Self { image, languages: hints }
    }
}

/// Optical text recognition engine. One call per image.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Get the engine name (e.g., "vision", "tesseract")
    fn engine_name(&self) -> &str;

    /// Recognize the text of one image, lines separated by '\n'
    async fn recognize(&self, request: RecognitionRequest) -> Result<String, ApiError>;
}

/// Text-generation service that turns a prepared prompt into a summary
#[async_trait]
pub trait SummaryClient: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn summarize(&self, prompt: &str) -> Result<String, ApiError>;
}
