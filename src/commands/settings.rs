use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::models::{Settings, UpdateSettingsInput};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Read settings from a JSON file. A missing file yields the defaults and
/// missing fields take their default values.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        log::info!("No settings file at {:?}, using defaults", path);
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    settings.validate().map_err(SettingsError::Invalid)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    settings.validate().map_err(SettingsError::Invalid)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(settings)?)?;
    log::info!("Settings saved to {:?}", path);
    Ok(())
}

/// Apply the provided fields on top of `current`. Nothing changes if the
/// result does not validate.
pub fn update_settings(current: &Settings, input: UpdateSettingsInput) -> Result<Settings, SettingsError> {
    let mut settings = current.clone();

    if let Some(val) = input.initial_equity {
        settings.initial_equity = val;
    }
    if let Some(val) = input.default_leverage {
        settings.default_leverage = val;
    }
    if let Some(val) = input.keyword_window {
        settings.keyword_window = val;
    }
    if let Some(val) = input.min_lines_for_chunking {
        settings.segmentation.min_lines_for_chunking = val;
    }
    if let Some(val) = input.min_chunk_lines {
        settings.segmentation.min_chunk_lines = val;
    }
    if let Some(val) = input.chunk_divisor {
        settings.segmentation.chunk_divisor = val;
    }
    if let Some(val) = input.recognition_languages {
        settings.recognition_languages = val;
    }

    settings.validate().map_err(SettingsError::Invalid)?;
    Ok(settings)
}
