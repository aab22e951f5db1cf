pub mod client;
pub mod error;

pub use client::{RecognitionRequest, SummaryClient, TextRecognizer, DEFAULT_RECOGNITION_LANGUAGES};
pub use error::ApiError;
