use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("No text recognized in image")]
    NoTextRecognized,

    #[error("No valid trade could be extracted")]
    NoValidRecordExtracted,

    #[error("CSV is missing required columns: {}", .missing.join(", "))]
    CsvMissingRequiredColumns { missing: Vec<String> },

    #[error("Line {line}: {reason}")]
    CsvRowInvalid { line: u64, reason: String },

    #[error("Unrecognized date: {0}")]
    DateParseFailure(String),

    #[error("CSV read error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Recognition failed: {0}")]
    Recognition(ApiError),
}

impl ImportError {
    /// Whether the caller can keep going with the rest of the batch
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ImportError::CsvRowInvalid { .. } | ImportError::DateParseFailure(_)
        )
    }
}

impl From<ApiError> for ImportError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidImage(msg) => ImportError::InvalidImage(msg),
            other => ImportError::Recognition(other),
        }
    }
}
