use chrono::{DateTime, Utc};

use crate::models::{profit_amount, profit_rate, RawTrade, TradeRecord, TradeSource, DEFAULT_LEVERAGE};

/// Tolerance for the scraped-vs-computed profit cross-check
const PROFIT_CROSS_CHECK_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy)]
pub struct TradeDefaults {
    pub default_leverage: u32,
    /// Stamp used when neither timestamp could be recovered
    pub now: DateTime<Utc>,
    pub source: TradeSource,
}

impl TradeDefaults {
    pub fn new(source: TradeSource, now: DateTime<Utc>) -> Self {
        Self {
            default_leverage: DEFAULT_LEVERAGE,
            now,
            source,
        }
    }
}

/// `|pnl| / |close - open|`; zero when the prices do not move
pub fn derive_position_size(profit_amount: f64, open_price: f64, close_price: f64) -> f64 {
    let delta = (close_price - open_price).abs();
    if delta <= f64::EPSILON || !profit_amount.is_finite() {
        return 0.0;
    }
    profit_amount.abs() / delta
}

/// Turn a raw field bag into a validated record.
///
/// Returns `None` when the symbol is empty or either price is missing or not
/// strictly positive. Profit amount and rate always come from the prices; a
/// scraped profit amount is only used to derive a missing position size.
pub fn normalize_trade(raw: RawTrade, defaults: &TradeDefaults) -> Option<TradeRecord> {
    let symbol = raw
        .symbol
        .as_deref()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty());
    let Some(symbol) = symbol else {
        log::debug!("Rejected trade: missing symbol");
        return None;
    };

    let positive = |p: Option<f64>| p.filter(|p| p.is_finite() && *p > 0.0);
    let (Some(open_price), Some(close_price)) = (positive(raw.open_price), positive(raw.close_price)) else {
        log::debug!(
            "Rejected {} trade: open={:?} close={:?}",
            symbol,
            raw.open_price,
            raw.close_price
        );
        return None;
    };

    let side = raw.side.unwrap_or_default();
    let leverage = raw
        .leverage
        .filter(|l| *l > 0)
        .unwrap_or(defaults.default_leverage.max(1));

    let mut position_size = raw
        .position_size
        .filter(|s| s.is_finite())
        .map(f64::abs)
        .unwrap_or(0.0);
    if position_size == 0.0 {
        if let Some(pnl) = raw.profit_amount.filter(|p| *p != 0.0) {
            position_size = derive_position_size(pnl, open_price, close_price);
        }
    }

    let (open_time, close_time) = match (raw.open_time, raw.close_time) {
        (Some(open), Some(close)) => (open, close),
        (Some(open), None) => (open, open),
        (None, Some(close)) => (close, close),
        (None, None) => (defaults.now, defaults.now),
    };

    let amount = profit_amount(side, open_price, close_price, position_size);
    let rate = profit_rate(side, open_price, close_price, leverage);

    if let Some(scraped) = raw.profit_amount {
        if (scraped - amount).abs() > PROFIT_CROSS_CHECK_TOLERANCE {
            log::debug!(
                "{} profit cross-check: scraped {:.4}, computed {:.4}",
                symbol,
                scraped,
                amount
            );
        }
    }

    Some(TradeRecord {
        symbol,
        side,
        open_time: Some(open_time),
        close_time: Some(close_time),
        open_price,
        close_price,
        leverage,
        position_size,
        profit_amount: amount,
        profit_rate: rate,
        source: raw.source.unwrap_or(defaults.source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Side, TradeStatus};
    use chrono::TimeZone;

    fn defaults() -> TradeDefaults {
        TradeDefaults::new(TradeSource::Ocr, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
    }

    fn raw(open: f64, close: f64) -> RawTrade {
        RawTrade {
            symbol: Some("btcusdt".to_string()),
            open_price: Some(open),
            close_price: Some(close),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_missing_symbol_or_bad_prices() {
        let d = defaults();
        assert!(normalize_trade(RawTrade { symbol: None, ..raw(1.0, 2.0) }, &d).is_none());
        assert!(normalize_trade(RawTrade { symbol: Some("  ".into()), ..raw(1.0, 2.0) }, &d).is_none());
        assert!(normalize_trade(raw(0.0, 2.0), &d).is_none());
        assert!(normalize_trade(raw(1.0, -2.0), &d).is_none());
        assert!(normalize_trade(RawTrade { close_price: None, ..raw(1.0, 2.0) }, &d).is_none());
    }

    #[test]
    fn test_defaults_are_applied() {
        let d = defaults();
        let trade = normalize_trade(raw(100.0, 110.0), &d).unwrap();
        assert_eq!(trade.symbol, "BTCUSDT");
        assert_eq!(trade.side, Side::Long);
        assert_eq!(trade.leverage, 10);
        assert_eq!(trade.position_size, 0.0);
        assert_eq!(trade.profit_amount, 0.0);
        assert_eq!(trade.status(), TradeStatus::Breakeven);
        assert_eq!(trade.open_time, Some(d.now));
        assert_eq!(trade.close_time, Some(d.now));
        assert_eq!(trade.source, TradeSource::Ocr);
        assert!((trade.profit_rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_timestamp_is_copied() {
        let d = defaults();
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        let trade = normalize_trade(RawTrade { close_time: Some(t), ..raw(1.0, 2.0) }, &d).unwrap();
        assert_eq!(trade.open_time, Some(t));
        assert_eq!(trade.close_time, Some(t));
    }

    #[test]
    fn test_scraped_profit_only_derives_size() {
        let d = defaults();
        // Short 2000 -> 1900, scraped pnl +50 means 0.5 units
        let trade = normalize_trade(
            RawTrade {
                side: Some(Side::Short),
                profit_amount: Some(50.0),
                ..raw(2000.0, 1900.0)
            },
            &d,
        )
        .unwrap();
        assert!((trade.position_size - 0.5).abs() < 1e-9);
        assert!((trade.profit_amount - 50.0).abs() < 1e-9);

        // A known size wins over a wrong scraped pnl
        let trade = normalize_trade(
            RawTrade {
                position_size: Some(1.0),
                profit_amount: Some(999.0),
                ..raw(100.0, 90.0)
            },
            &d,
        )
        .unwrap();
        assert!((trade.profit_amount + 10.0).abs() < 1e-9);
        assert_eq!(trade.status(), TradeStatus::Loss);
    }

    #[test]
    fn test_derive_size_guards_zero_delta() {
        assert_eq!(derive_position_size(100.0, 50.0, 50.0), 0.0);
        assert!((derive_position_size(-100.0, 50000.0, 51000.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_formula_invariants_hold_for_a_grid_of_inputs() {
        let d = defaults();
        for side in [Side::Long, Side::Short] {
            for (open, close) in [(100.0, 120.0), (100.0, 80.0), (3.5, 3.5), (0.0021, 0.0019)] {
                for leverage in [1, 5, 125] {
                    let trade = normalize_trade(
                        RawTrade {
                            side: Some(side),
                            leverage: Some(leverage),
                            position_size: Some(2.0),
                            ..raw(open, close)
                        },
                        &d,
                    )
                    .unwrap();

                    let expected_rate = ((close - open) / open) * side.direction_sign() * leverage as f64;
                    assert!((trade.profit_rate - expected_rate).abs() < 1e-9);
                    let status = trade.status();
                    if trade.profit_amount > 0.0 {
                        assert_eq!(status, TradeStatus::Win);
                    } else if trade.profit_amount < 0.0 {
                        assert_eq!(status, TradeStatus::Loss);
                    } else {
                        assert_eq!(status, TradeStatus::Breakeven);
                    }
                }
            }
        }
    }
}
