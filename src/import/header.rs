use std::collections::HashMap;

use super::error::ImportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalColumn {
    Symbol,
    Side,
    EntryPrice,
    ClosePrice,
    Volume,
    RealizedPnl,
    Leverage,
    OpenedAt,
    ClosedAt,
}

/// Columns that claim header cells first. Volume goes before ClosedAt so that
/// "Closed Vol." is never taken for a close timestamp.
const RESOLUTION_ORDER: [CanonicalColumn; 9] = [
    CanonicalColumn::Symbol,
    CanonicalColumn::EntryPrice,
    CanonicalColumn::ClosePrice,
    CanonicalColumn::Volume,
    CanonicalColumn::RealizedPnl,
    CanonicalColumn::Leverage,
    CanonicalColumn::OpenedAt,
    CanonicalColumn::ClosedAt,
    CanonicalColumn::Side,
];

impl CanonicalColumn {
    pub fn label(self) -> &'static str {
        match self {
            CanonicalColumn::Symbol => "symbol",
            CanonicalColumn::Side => "side",
            CanonicalColumn::EntryPrice => "entry price",
            CanonicalColumn::ClosePrice => "close price",
            CanonicalColumn::Volume => "volume",
            CanonicalColumn::RealizedPnl => "realized pnl",
            CanonicalColumn::Leverage => "leverage",
            CanonicalColumn::OpenedAt => "opened at",
            CanonicalColumn::ClosedAt => "closed at",
        }
    }

    pub fn is_required(self) -> bool {
        matches!(
            self,
            CanonicalColumn::Symbol | CanonicalColumn::EntryPrice | CanonicalColumn::ClosePrice
        )
    }

    /// Lower-case aliases, most specific first. "pirce" is a real vendor typo.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            CanonicalColumn::Symbol => &[
                "symbol", "futures", "contract", "pair", "instrument", "asset", "合约", "交易对", "币对",
            ],
            CanonicalColumn::Side => &["side", "direction", "position side", "方向"],
            CanonicalColumn::EntryPrice => &[
                "entry price",
                "entry pirce",
                "open price",
                "open pirce",
                "opening price",
                "average entry",
                "avg entry",
                "开仓均价",
                "开仓价格",
                "开仓价",
                "entry",
            ],
            CanonicalColumn::ClosePrice => &[
                "close price",
                "close pirce",
                "exit price",
                "exit pirce",
                "closing price",
                "average close",
                "avg close",
                "平仓均价",
                "平仓价格",
                "平仓价",
                "exit",
            ],
            CanonicalColumn::Volume => &[
                "closed vol",
                "closed volume",
                "position size",
                "volume",
                "quantity",
                "qty",
                "size",
                "amount",
                "平仓数量",
                "数量",
            ],
            CanonicalColumn::RealizedPnl => &[
                "realized pnl",
                "realised pnl",
                "closing pnl",
                "net pnl",
                "pnl",
                "profit",
                "已实现盈亏",
                "盈亏",
            ],
            CanonicalColumn::Leverage => &["leverage", "杠杆"],
            CanonicalColumn::OpenedAt => &[
                "opened at",
                "open time",
                "opening time",
                "entry time",
                "opened",
                "开仓时间",
            ],
            CanonicalColumn::ClosedAt => &[
                "closed at",
                "close time",
                "closing time",
                "exit time",
                "closed",
                "平仓时间",
            ],
        }
    }
}

/// Canonical column -> cell index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: HashMap<CanonicalColumn, usize>,
}

impl ColumnMap {
    pub fn get(&self, column: CanonicalColumn) -> Option<usize> {
        self.columns.get(&column).copied()
    }

    /// Trimmed cell for a column, None if unmapped, missing or blank
    pub fn cell<'a>(&self, row: &'a [String], column: CanonicalColumn) -> Option<&'a str> {
        let idx = self.get(column)?;
        row.get(idx).map(|c| c.trim()).filter(|c| !c.is_empty())
    }
}

fn normalize_header_cell(cell: &str) -> String {
    cell.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Exact alias matches win, then substring matches in alias order. A cell is
/// claimed by at most one column.
pub fn resolve_header(header: &[String]) -> Result<ColumnMap, ImportError> {
    let cells: Vec<String> = header.iter().map(|c| normalize_header_cell(c)).collect();
    let mut claimed = vec![false; cells.len()];
    let mut map = ColumnMap::default();

    for column in RESOLUTION_ORDER {
        let aliases = column.aliases();

        let exact = cells
            .iter()
            .enumerate()
            .find(|(i, cell)| !claimed[*i] && aliases.contains(&cell.as_str()))
            .map(|(i, _)| i);

        let found = exact.or_else(|| {
            aliases.iter().find_map(|alias| {
                cells
                    .iter()
                    .enumerate()
                    .find(|(i, cell)| !claimed[*i] && cell.contains(alias))
                    .map(|(i, _)| i)
            })
        });

        if let Some(idx) = found {
            claimed[idx] = true;
            map.columns.insert(column, idx);
        }
    }

    let missing: Vec<String> = RESOLUTION_ORDER
        .iter()
        .filter(|c| c.is_required() && map.get(**c).is_none())
        .map(|c| c.label().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::CsvMissingRequiredColumns { missing });
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_resolves_misspelled_vendor_header() {
        let map = resolve_header(&header(&[
            "Symbol",
            " Entry Price",
            "Close Pirce",
            "Closed Vol.",
            "Closing PNL",
            "Opened",
            "Closed",
        ]))
        .unwrap();

        assert_eq!(map.get(CanonicalColumn::Symbol), Some(0));
        assert_eq!(map.get(CanonicalColumn::EntryPrice), Some(1));
        assert_eq!(map.get(CanonicalColumn::ClosePrice), Some(2));
        assert_eq!(map.get(CanonicalColumn::Volume), Some(3));
        assert_eq!(map.get(CanonicalColumn::RealizedPnl), Some(4));
        assert_eq!(map.get(CanonicalColumn::OpenedAt), Some(5));
        assert_eq!(map.get(CanonicalColumn::ClosedAt), Some(6));
        assert_eq!(map.get(CanonicalColumn::Side), None);
    }

    #[test]
    fn test_bitget_style_header() {
        let map = resolve_header(&header(&[
            "\u{feff}Futures",
            "Opening time",
            "Average entry price",
            "Average closing price",
            "Closed amount",
            "Realized PnL",
            "Closing time",
        ]))
        .unwrap();

        assert_eq!(map.get(CanonicalColumn::Symbol), Some(0));
        assert_eq!(map.get(CanonicalColumn::EntryPrice), Some(2));
        assert_eq!(map.get(CanonicalColumn::ClosePrice), Some(3));
        assert_eq!(map.get(CanonicalColumn::Volume), Some(4));
        assert_eq!(map.get(CanonicalColumn::RealizedPnl), Some(5));
        assert_eq!(map.get(CanonicalColumn::OpenedAt), Some(1));
        assert_eq!(map.get(CanonicalColumn::ClosedAt), Some(6));
    }

    #[test]
    fn test_missing_required_columns_are_listed() {
        let err = resolve_header(&header(&["Symbol", "Volume", "PNL"])).unwrap_err();
        match err {
            ImportError::CsvMissingRequiredColumns { missing } => {
                assert_eq!(missing, vec!["entry price", "close price"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cell_lookup_skips_blank_cells() {
        let map = resolve_header(&header(&["symbol", "entry price", "close price", "side"])).unwrap();
        let row = header(&["BTCUSDT", " 1.5 ", "2", "  "]);
        assert_eq!(map.cell(&row, CanonicalColumn::EntryPrice), Some("1.5"));
        assert_eq!(map.cell(&row, CanonicalColumn::Side), None);
        assert_eq!(map.cell(&row, CanonicalColumn::OpenedAt), None);
    }
}
