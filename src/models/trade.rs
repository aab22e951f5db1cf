use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    #[default]
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short
    pub fn direction_sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Long => "LONG",
            Side::Short => "SHORT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeStatus {
    #[serde(rename = "WIN")]
    Win,
    #[serde(rename = "LOSS")]
    Loss,
    #[serde(rename = "BE")]
    Breakeven,
}

impl TradeStatus {
    /// Strict sign test: only an exact zero is a breakeven
    pub fn from_profit(profit_amount: f64) -> Self {
        if profit_amount > 0.0 {
            TradeStatus::Win
        } else if profit_amount < 0.0 {
            TradeStatus::Loss
        } else {
            TradeStatus::Breakeven
        }
    }
}

/// Where a record came from (informational only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSource {
    Manual,
    Ocr,
    Csv,
}

impl TradeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeSource::Manual => "manual",
            TradeSource::Ocr => "ocr",
            TradeSource::Csv => "csv",
        }
    }
}

/// A single closed position, as emitted by the import paths.
///
/// Records are only built through [`crate::validate::normalize_trade`], which
/// guarantees a non-empty symbol, positive prices and profit figures that
/// follow [`profit_amount`] and [`profit_rate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub side: Side,
    pub open_time: Option<DateTime<Utc>>,
    pub close_time: Option<DateTime<Utc>>,
    pub open_price: f64,
    pub close_price: f64,
    pub leverage: u32,
    pub position_size: f64,
    pub profit_amount: f64,
    pub profit_rate: f64,
    pub source: TradeSource,
}

impl TradeRecord {
    pub fn status(&self) -> TradeStatus {
        TradeStatus::from_profit(self.profit_amount)
    }

    pub fn is_valid(&self) -> bool {
        !self.symbol.trim().is_empty() && self.open_price > 0.0 && self.close_price > 0.0
    }

    /// Dedup key handed to the persistence layer
    pub fn fingerprint(&self) -> String {
        let fmt_time = |t: Option<DateTime<Utc>>| {
            t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default()
        };

        // -0.0 would otherwise print with a sign
        let fmt_num = |v: f64| format!("{:.8}", if v == 0.0 { 0.0 } else { v });

        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.source.as_str(),
            self.symbol.to_lowercase(),
            self.side.as_str().to_lowercase(),
            fmt_time(self.open_time),
            fmt_time(self.close_time),
            fmt_num(self.open_price),
            fmt_num(self.close_price),
            fmt_num(self.position_size),
            fmt_num(self.profit_amount)
        )
    }
}

/// Field bag produced by the extractors and the CSV row mapper, before validation.
/// Every field is optional; scraped profit figures are advisory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrade {
    pub symbol: Option<String>,
    pub side: Option<Side>,
    pub open_time: Option<DateTime<Utc>>,
    pub close_time: Option<DateTime<Utc>>,
    pub open_price: Option<f64>,
    pub close_price: Option<f64>,
    pub leverage: Option<u32>,
    pub position_size: Option<f64>,
    pub profit_amount: Option<f64>,
    pub profit_rate: Option<f64>,
    pub source: Option<TradeSource>,
}

/// `(close - open) * sign * size`
pub fn profit_amount(side: Side, open_price: f64, close_price: f64, position_size: f64) -> f64 {
    (close_price - open_price) * side.direction_sign() * position_size
}

/// `((close - open) / open) * sign * leverage`, as a fraction
pub fn profit_rate(side: Side, open_price: f64, close_price: f64, leverage: u32) -> f64 {
    if open_price <= 0.0 {
        return 0.0;
    }
    ((close_price - open_price) / open_price) * side.direction_sign() * leverage as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub initial_equity: f64,
    pub current_equity: f64,
    pub total_profit: f64,
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
    pub win_rate: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub profit_loss_ratio: f64,
    pub max_drawdown: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub profit_factor: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
}
