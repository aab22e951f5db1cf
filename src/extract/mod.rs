pub mod dates;
pub mod fields;
pub mod normalizer;
pub mod numbers;
pub mod rules;
pub mod segmenter;

use chrono::{DateTime, Utc};

use crate::import::ImportError;
use crate::models::{RawTrade, SegmentationSettings, Settings, TradeRecord, TradeSource};
use crate::validate::{normalize_trade, TradeDefaults};

pub use normalizer::{normalize_text, NormalizedText};
pub use segmenter::{segment_trades, Segmentation, SegmentationStrategy};

/// Everything an extraction run needs besides the text itself
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    pub default_leverage: u32,
    pub keyword_window: usize,
    pub segmentation: SegmentationSettings,
    pub source: TradeSource,
    pub now: DateTime<Utc>,
}

impl ExtractionContext {
    pub fn new(settings: &Settings, source: TradeSource) -> Self {
        Self {
            default_leverage: settings.default_leverage,
            keyword_window: settings.keyword_window,
            segmentation: settings.segmentation.clone(),
            source,
            now: Utc::now(),
        }
    }

    /// Pin the fallback timestamp (tests, replays)
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn trade_defaults(&self) -> TradeDefaults {
        TradeDefaults {
            default_leverage: self.default_leverage,
            now: self.now,
            source: self.source,
        }
    }
}

/// Run every field extractor over one span of text
pub fn extract_raw_trade(text: &str, seed_symbol: Option<&str>, ctx: &ExtractionContext) -> RawTrade {
    let window = ctx.keyword_window;

    RawTrade {
        symbol: fields::extract_symbol(text, window).or_else(|| seed_symbol.map(str::to_string)),
        side: Some(fields::extract_side(text)),
        open_time: fields::extract_open_time(text, window),
        close_time: fields::extract_close_time(text, window),
        open_price: fields::extract_open_price(text, window),
        close_price: fields::extract_close_price(text, window),
        leverage: fields::extract_leverage(text, window),
        position_size: fields::extract_position_size(text, window),
        profit_amount: fields::extract_profit_amount(text, window),
        profit_rate: fields::extract_profit_rate(text, window),
        source: Some(ctx.source),
    }
}

/// Extract and validate a single trade from one span
pub fn extract_trade(text: &str, seed_symbol: Option<&str>, ctx: &ExtractionContext) -> Option<TradeRecord> {
    normalize_trade(extract_raw_trade(text, seed_symbol, ctx), &ctx.trade_defaults())
}

/// Full OCR path: normalize, try the multi-trade split, fall back to one record
/// over the whole blob.
pub fn extract_trades(raw_text: &str, ctx: &ExtractionContext) -> Result<Vec<TradeRecord>, ImportError> {
    let text = normalize_text(raw_text);
    if text.is_empty() {
        return Err(ImportError::NoTextRecognized);
    }

    match segment_trades(&text, ctx) {
        Segmentation::Split { strategy, records } => {
            log::info!("Split text into {} trades using {:?}", records.len(), strategy);
            Ok(records)
        }
        Segmentation::NoSplit => {
            let trade = extract_trade(&text.joined, None, ctx).ok_or(ImportError::NoValidRecordExtracted)?;
            Ok(vec![trade])
        }
    }
}
