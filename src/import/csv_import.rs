use csv::{ReaderBuilder, Trim};

use super::error::ImportError;
use super::header::{resolve_header, CanonicalColumn, ColumnMap};
use crate::extract::fields::{detect_side, normalize_symbol, parse_cell_time};
use crate::extract::numbers::parse_decimal;
use crate::extract::ExtractionContext;
use crate::models::{RawTrade, Side, TradeRecord};
use crate::validate::normalize_trade;

/// A tokenized CSV row with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: u64,
    pub cells: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CsvImport {
    pub records: Vec<TradeRecord>,
    /// Rows that were skipped, as `CsvRowInvalid`
    pub errors: Vec<ImportError>,
    pub total_rows: usize,
}

/// Quote-aware split of the whole file. Commas inside double quotes are literal
/// and `""` inside a quoted field is one quote. Blank lines are dropped.
pub fn tokenize_csv(content: &str) -> Result<Vec<CsvRow>, ImportError> {
    let content = content.trim_start_matches('\u{feff}');
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows.push(CsvRow {
            line,
            cells: record.iter().map(str::to_string).collect(),
        });
    }
    Ok(rows)
}

/// Tokenize a single line. A blank line has no cells.
pub fn split_csv_line(line: &str) -> Result<Vec<String>, ImportError> {
    let rows = tokenize_csv(line)?;
    Ok(rows.into_iter().next().map(|row| row.cells).unwrap_or_default())
}

/// Import a CSV export. Fails only when the header cannot be resolved or when
/// not a single row survives validation; bad rows are collected and skipped.
pub fn import_csv(content: &str, ctx: &ExtractionContext) -> Result<CsvImport, ImportError> {
    let rows = tokenize_csv(content)?;
    let Some((header, data)) = rows.split_first() else {
        return Err(ImportError::CsvMissingRequiredColumns {
            missing: vec![
                CanonicalColumn::Symbol.label().to_string(),
                CanonicalColumn::EntryPrice.label().to_string(),
                CanonicalColumn::ClosePrice.label().to_string(),
            ],
        });
    };

    let columns = resolve_header(&header.cells)?;

    let mut import = CsvImport {
        total_rows: data.len(),
        ..Default::default()
    };

    for row in data {
        match map_row(row, &columns, ctx) {
            Ok(record) => import.records.push(record),
            Err(e) => {
                log::debug!("Skipping CSV row: {}", e);
                import.errors.push(e);
            }
        }
    }

    log::info!(
        "CSV import: {} of {} rows accepted, {} skipped",
        import.records.len(),
        import.total_rows,
        import.errors.len()
    );

    if import.records.is_empty() {
        return Err(ImportError::NoValidRecordExtracted);
    }
    Ok(import)
}

/// Map one data row into a validated record
pub fn map_row(row: &CsvRow, columns: &ColumnMap, ctx: &ExtractionContext) -> Result<TradeRecord, ImportError> {
    let invalid = |reason: String| ImportError::CsvRowInvalid {
        line: row.line,
        reason,
    };
    let cells = row.cells.as_slice();

    let symbol_cell = columns
        .cell(cells, CanonicalColumn::Symbol)
        .ok_or_else(|| invalid("missing symbol".to_string()))?;
    let symbol = normalize_symbol(symbol_cell).ok_or_else(|| invalid(format!("invalid symbol: {}", symbol_cell)))?;

    let price = |column: CanonicalColumn| {
        columns
            .cell(cells, column)
            .and_then(parse_decimal)
            .filter(|p| *p > 0.0)
    };
    let open_price = price(CanonicalColumn::EntryPrice)
        .ok_or_else(|| invalid(format!("invalid entry price: {:?}", columns.cell(cells, CanonicalColumn::EntryPrice))))?;
    let close_price = price(CanonicalColumn::ClosePrice)
        .ok_or_else(|| invalid(format!("invalid close price: {:?}", columns.cell(cells, CanonicalColumn::ClosePrice))))?;

    let side = columns
        .cell(cells, CanonicalColumn::Side)
        .and_then(side_from_cell)
        .or_else(|| detect_side(symbol_cell))
        .or_else(|| detect_side(&cells.join(" ")));

    let raw = RawTrade {
        symbol: Some(symbol),
        side,
        open_time: columns.cell(cells, CanonicalColumn::OpenedAt).and_then(parse_cell_time),
        close_time: columns.cell(cells, CanonicalColumn::ClosedAt).and_then(parse_cell_time),
        open_price: Some(open_price),
        close_price: Some(close_price),
        leverage: columns
            .cell(cells, CanonicalColumn::Leverage)
            .and_then(parse_decimal)
            .filter(|l| *l >= 1.0)
            .map(|l| l.round() as u32),
        position_size: columns.cell(cells, CanonicalColumn::Volume).and_then(parse_decimal),
        profit_amount: columns.cell(cells, CanonicalColumn::RealizedPnl).and_then(parse_decimal),
        profit_rate: None,
        source: Some(ctx.source),
    };

    normalize_trade(raw, &ctx.trade_defaults()).ok_or_else(|| invalid("failed validation".to_string()))
}

/// Side columns also use order wording ("Buy"/"Sell")
fn side_from_cell(value: &str) -> Option<Side> {
    let lowered = value.to_lowercase();
    if lowered.starts_with("buy") {
        return Some(Side::Long);
    }
    if lowered.starts_with("sell") {
        return Some(Side::Short);
    }
    detect_side(value)
}
