//! Trade evidence ingestion: turns recognized screenshot text and exchange
//! CSV exports into validated trade records, and computes performance
//! analytics over them.
//!
//! Text recognition and summary generation are external services reached
//! through the [`api::TextRecognizer`] and [`api::SummaryClient`] traits.

pub mod api;
pub mod commands;
pub mod extract;
pub mod import;
pub mod models;
pub mod validate;

pub use api::{ApiError, RecognitionRequest, SummaryClient, TextRecognizer};
pub use commands::{
    analyze_performance, create_trade, dedupe_records, extract_trades_from_text, get_daily_equity_curve,
    get_dashboard_stats, get_performance_summary, import_csv_trades, import_screenshot, import_screenshots,
    load_settings, preview_csv_import, request_summary, save_settings, update_settings, DateRange, ImportPreview,
    ImportResult, PerformanceReport,
};
pub use extract::{extract_trades, ExtractionContext, Segmentation, SegmentationStrategy};
pub use import::{import_csv, ImportError};
pub use models::{
    EquityPoint, PerformanceSummary, RawTrade, Settings, Side, TradeRecord, TradeSource, TradeStatus,
    UpdateSettingsInput,
};
pub use validate::normalize_trade;
