use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{RecognitionRequest, TextRecognizer};
use crate::extract::{extract_trades, ExtractionContext};
use crate::import::{import_csv, ImportError};
use crate::models::{Settings, TradeRecord, TradeSource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPreview {
    pub symbol: String,
    pub side: String,
    pub open_price: f64,
    pub close_price: f64,
    pub position_size: f64,
    pub profit_amount: f64,
    pub opening_time: String,
    pub closing_time: String,
    pub fingerprint: String,
    pub duplicate: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub records: Vec<TradeRecord>,
    pub imported: usize,
    pub duplicates: usize,
    pub errors: Vec<String>,
}

impl ImportPreview {
    fn from_record(record: &TradeRecord, known: &HashSet<String>) -> Self {
        let fingerprint = record.fingerprint();
        let time = |t: Option<DateTime<Utc>>| t.map(|t| t.to_rfc3339()).unwrap_or_default();
        Self {
            symbol: record.symbol.clone(),
            side: record.side.as_str().to_string(),
            open_price: record.open_price,
            close_price: record.close_price,
            position_size: record.position_size,
            profit_amount: record.profit_amount,
            opening_time: time(record.open_time),
            closing_time: time(record.close_time),
            duplicate: known.contains(&fingerprint),
            fingerprint,
        }
    }
}

/// Drop records whose fingerprint is already known or repeats within the batch
pub fn dedupe_records(records: Vec<TradeRecord>, known: &HashSet<String>) -> (Vec<TradeRecord>, usize) {
    let mut seen = HashSet::new();
    let mut duplicates = 0;

    let unique = records
        .into_iter()
        .filter(|record| {
            let fingerprint = record.fingerprint();
            if known.contains(&fingerprint) || !seen.insert(fingerprint) {
                duplicates += 1;
                false
            } else {
                true
            }
        })
        .collect();

    (unique, duplicates)
}

fn into_result(records: Vec<TradeRecord>, errors: Vec<String>, known: &HashSet<String>) -> ImportResult {
    let (records, duplicates) = dedupe_records(records, known);
    ImportResult {
        imported: records.len(),
        records,
        duplicates,
        errors,
    }
}

/// Parse a CSV export and return previews of its trades without importing them
pub fn preview_csv_import(csv_content: &str, settings: &Settings, known: &HashSet<String>) -> Result<Vec<ImportPreview>, ImportError> {
    let ctx = ExtractionContext::new(settings, TradeSource::Csv);
    let import = import_csv(csv_content, &ctx)?;

    Ok(import
        .records
        .iter()
        .map(|record| ImportPreview::from_record(record, known))
        .collect())
}

pub fn import_csv_trades(csv_content: &str, settings: &Settings, known: &HashSet<String>) -> Result<ImportResult, ImportError> {
    let ctx = ExtractionContext::new(settings, TradeSource::Csv);
    let import = import_csv(csv_content, &ctx)?;
    let errors = import.errors.iter().map(|e| e.to_string()).collect();

    let result = into_result(import.records, errors, known);
    log::info!(
        "Imported {} CSV trades ({} duplicates, {} skipped rows)",
        result.imported,
        result.duplicates,
        result.errors.len()
    );
    Ok(result)
}

/// Extract trades from text that was already recognized elsewhere
pub fn extract_trades_from_text(text: &str, settings: &Settings, known: &HashSet<String>) -> Result<ImportResult, ImportError> {
    extract_trades_at(text, settings, known, Utc::now())
}

/// `now` stamps trades whose times could not be read
fn extract_trades_at(
    text: &str,
    settings: &Settings,
    known: &HashSet<String>,
    now: DateTime<Utc>,
) -> Result<ImportResult, ImportError> {
    let ctx = ExtractionContext::new(settings, TradeSource::Ocr).at(now);
    let records = extract_trades(text, &ctx)?;
    Ok(into_result(records, Vec::new(), known))
}

/// Recognize one screenshot and extract its trades
pub async fn import_screenshot(
    recognizer: &dyn TextRecognizer,
    image: Vec<u8>,
    settings: &Settings,
    known: &HashSet<String>,
) -> Result<ImportResult, ImportError> {
    import_screenshot_at(recognizer, image, settings, known, Utc::now()).await
}

async fn import_screenshot_at(
    recognizer: &dyn TextRecognizer,
    image: Vec<u8>,
    settings: &Settings,
    known: &HashSet<String>,
    now: DateTime<Utc>,
) -> Result<ImportResult, ImportError> {
    if image.is_empty() {
        return Err(ImportError::InvalidImage("image is empty".to_string()));
    }

    let request = RecognitionRequest::new(image, &settings.recognition_languages);
    let text = recognizer.recognize(request).await?;
    if text.trim().is_empty() {
        return Err(ImportError::NoTextRecognized);
    }
    log::debug!("{} recognized {} characters", recognizer.engine_name(), text.chars().count());

    extract_trades_at(&text, settings, known, now)
}

/// Screenshots are processed one after another. A failing image is reported
/// in `errors` and does not stop the batch. Undated trades across the batch
/// share one timestamp so repeated screenshots dedupe.
pub async fn import_screenshots(
    recognizer: &dyn TextRecognizer,
    images: Vec<Vec<u8>>,
    settings: &Settings,
    known: &HashSet<String>,
) -> ImportResult {
    let mut known = known.clone();
    let mut result = ImportResult::default();
    let now = Utc::now();

    for (index, image) in images.into_iter().enumerate() {
        match import_screenshot_at(recognizer, image, settings, &known, now).await {
            Ok(batch) => {
                known.extend(batch.records.iter().map(TradeRecord::fingerprint));
                result.imported += batch.imported;
                result.duplicates += batch.duplicates;
                result.records.extend(batch.records);
            }
            Err(e) => {
                log::warn!("Screenshot {} failed: {}", index + 1, e);
                result.errors.push(format!("Image {}: {}", index + 1, e));
            }
        }
    }

    log::info!(
        "Imported {} trades from screenshots ({} duplicates, {} failed images)",
        result.imported,
        result.duplicates,
        result.errors.len()
    );
    result
}
