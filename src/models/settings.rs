use serde::{Deserialize, Serialize};

pub const DEFAULT_INITIAL_EQUITY: f64 = 10_000.0;
pub const DEFAULT_LEVERAGE: u32 = 10;
pub const DEFAULT_KEYWORD_WINDOW: usize = 48;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub initial_equity: f64,
    pub default_leverage: u32,
    /// How many characters after a keyword are searched for its value
    pub keyword_window: usize,
    pub segmentation: SegmentationSettings,
    pub recognition_languages: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_equity: DEFAULT_INITIAL_EQUITY,
            default_leverage: DEFAULT_LEVERAGE,
            keyword_window: DEFAULT_KEYWORD_WINDOW,
            segmentation: SegmentationSettings::default(),
            recognition_languages: vec!["zh-Hans".to_string(), "en-US".to_string()],
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        if !self.initial_equity.is_finite() || self.initial_equity < 0.0 {
            return Err(format!("initial_equity must be a non-negative number, got {}", self.initial_equity));
        }
        if self.default_leverage == 0 {
            return Err("default_leverage must be at least 1".to_string());
        }
        if self.keyword_window == 0 {
            return Err("keyword_window must be at least 1".to_string());
        }
        if self.recognition_languages.is_empty() {
            return Err("recognition_languages must not be empty".to_string());
        }
        self.segmentation.validate()
    }
}

/// Thresholds for the fixed-chunk fallback of the segmenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationSettings {
    pub min_lines_for_chunking: usize,
    pub min_chunk_lines: usize,
    pub chunk_divisor: usize,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            min_lines_for_chunking: 6,
            min_chunk_lines: 3,
            chunk_divisor: 3,
        }
    }
}

impl SegmentationSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_chunk_lines == 0 {
            return Err("segmentation.min_chunk_lines must be at least 1".to_string());
        }
        if self.chunk_divisor == 0 {
            return Err("segmentation.chunk_divisor must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsInput {
    pub initial_equity: Option<f64>,
    pub default_leverage: Option<u32>,
    pub keyword_window: Option<usize>,
    pub min_lines_for_chunking: Option<usize>,
    pub min_chunk_lines: Option<usize>,
    pub chunk_divisor: Option<usize>,
    pub recognition_languages: Option<Vec<String>>,
}
