//! One pure function per trade field. Each walks its rule table and returns the
//! first value found, falling back to a keyword-free scan where that is safe.

use std::ops::Range;

use chrono::{DateTime, Utc};

use super::dates::{find_all_datetimes, parse_datetime, parse_datetime_prefix};
use super::numbers::parse_captured;
use super::rules::{self, FieldRule, ValuePattern};
use crate::models::Side;

pub fn extract_symbol(text: &str, window: usize) -> Option<String> {
    rules::find_after_keyword(text, rules::SYMBOL_RULES, window, symbol_from_captures)
        .or_else(|| rules::symbol_pattern().captures(text).and_then(|caps| symbol_from_captures(&caps)))
}

/// Byte ranges of every non-overlapping symbol occurrence
pub fn find_symbol_matches(text: &str) -> Vec<(Range<usize>, String)> {
    rules::symbol_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let symbol = symbol_from_captures(&caps)?;
            Some((whole.range(), symbol))
        })
        .collect()
}

pub fn contains_symbol(text: &str) -> bool {
    rules::symbol_pattern().is_match(text)
}

/// Best-effort cleanup of a CSV symbol cell: "BTC-USDT-SWAP" and "INJUSDT Short" become
/// "BTCUSDT"/"INJUSDT"; anything else is upper-cased and stripped to alphanumerics.
pub fn normalize_symbol(value: &str) -> Option<String> {
    if let Some(caps) = rules::symbol_pattern().captures(value) {
        return symbol_from_captures(&caps);
    }

    let first = value.split_whitespace().next()?;
    let symbol: String = first
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    (!symbol.is_empty()).then_some(symbol)
}

fn symbol_from_captures(caps: &regex::Captures<'_>) -> Option<String> {
    let base = caps.get(1)?.as_str();
    // Tickers are short; a longer run means OCR glued words together
    if base.is_empty() || base.len() > 20 {
        return None;
    }
    Some(format!("{}USDT", base.to_ascii_uppercase()))
}

/// Long keywords win over short ones; None when neither appears
pub fn detect_side(text: &str) -> Option<Side> {
    if rules::long_side_pattern().is_match(text) {
        Some(Side::Long)
    } else if rules::short_side_pattern().is_match(text) {
        Some(Side::Short)
    } else {
        None
    }
}

pub fn extract_side(text: &str) -> Side {
    detect_side(text).unwrap_or_default()
}

pub fn extract_open_time(text: &str, window: usize) -> Option<DateTime<Utc>> {
    extract_time(text, rules::OPEN_TIME_RULES, window).or_else(|| unlabeled_times(text).0)
}

pub fn extract_close_time(text: &str, window: usize) -> Option<DateTime<Utc>> {
    extract_time(text, rules::CLOSE_TIME_RULES, window).or_else(|| unlabeled_times(text).1)
}

fn extract_time(text: &str, rules: &[FieldRule], window: usize) -> Option<DateTime<Utc>> {
    rules::find_window_after_keyword(text, rules, window, time_after_keyword)
}

fn time_after_keyword(rule: &FieldRule, tail: &str) -> Option<DateTime<Utc>> {
    match rule.pattern {
        ValuePattern::DatePrefix => parse_datetime_prefix(tail),
        _ => parse_datetime_prefix(tail).or_else(|| super::dates::find_datetime(tail)),
    }
}

/// Only used when no time label exists anywhere: dates are read in order.
/// Short keywords ("开仓", "closed") only count as labels when a date follows them.
fn unlabeled_times(text: &str) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let labeled = rules::OPEN_TIME_RULES
        .iter()
        .chain(rules::CLOSE_TIME_RULES)
        .any(|rule| match rule.pattern {
            ValuePattern::DatePrefix => {
                rules::rule_matches(text, rule).any(|end| parse_datetime_prefix(&text[end..]).is_some())
            }
            _ => rules::rule_matches(text, rule).next().is_some(),
        });
    if labeled {
        return (None, None);
    }

    let mut found = find_all_datetimes(text).into_iter();
    (found.next(), found.next())
}

pub fn extract_open_price(text: &str, window: usize) -> Option<f64> {
    extract_price(text, rules::OPEN_PRICE_RULES, window)
}

pub fn extract_close_price(text: &str, window: usize) -> Option<f64> {
    extract_price(text, rules::CLOSE_PRICE_RULES, window)
}

fn extract_price(text: &str, rules: &[FieldRule], window: usize) -> Option<f64> {
    rules::find_after_keyword(text, rules, window, |caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| parse_captured(m.as_str()))
            .filter(|price| *price > 0.0)
    })
}

pub fn extract_leverage(text: &str, window: usize) -> Option<u32> {
    let positive = |caps: &regex::Captures<'_>| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|lev| *lev > 0)
    };

    rules::find_after_keyword(text, rules::LEVERAGE_RULES, window, positive).or_else(|| {
        rules::bare_leverage_pattern()
            .captures_iter(text)
            .find_map(|caps| positive(&caps))
    })
}

pub fn extract_position_size(text: &str, window: usize) -> Option<f64> {
    rules::find_after_keyword(text, rules::POSITION_SIZE_RULES, window, |caps| {
        if caps.get(2).is_some() {
            return None;
        }
        caps.get(1).and_then(|m| parse_captured(m.as_str())).map(f64::abs)
    })
}

pub fn extract_profit_amount(text: &str, window: usize) -> Option<f64> {
    rules::find_after_keyword(text, rules::PROFIT_AMOUNT_RULES, window, |caps| {
        // "+20%" or "10x" right after a pnl keyword is not an amount
        if caps.get(2).is_some() {
            return None;
        }
        caps.get(1).and_then(|m| parse_captured(m.as_str()))
    })
}

/// Returned as a fraction (20% -> 0.2)
pub fn extract_profit_rate(text: &str, window: usize) -> Option<f64> {
    let as_fraction = |caps: &regex::Captures<'_>| {
        caps.get(1)
            .and_then(|m| parse_captured(m.as_str()))
            .map(|pct| pct / 100.0)
    };

    rules::find_after_keyword(text, rules::PROFIT_RATE_RULES, window, as_fraction).or_else(|| {
        rules::percent_pattern()
            .captures_iter(text)
            .find_map(|caps| as_fraction(&caps))
    })
}

/// Parse a whole CSV cell as a timestamp, logging instead of failing
pub fn parse_cell_time(value: &str) -> Option<DateTime<Utc>> {
    if value.trim().is_empty() {
        return None;
    }
    match parse_datetime(value) {
        Ok(dt) => Some(dt),
        Err(e) => {
            log::debug!("{}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const SCREEN: &str = "BTCUSDT 永续 做空 20x 开仓时间 2024-01-01 10:00:00 平仓时间 2024-01-02 12:30:00 \
        开仓价格 50,000.50 USDT 平仓价格 49000.25 平仓数量 0.2 已实现盈亏 +200.05 USDT 收益率 +40.02%";

    #[test]
    fn test_symbol_with_perpetual_qualifier() {
        assert_eq!(extract_symbol(SCREEN, 48).as_deref(), Some("BTCUSDT"));
        assert_eq!(extract_symbol("合约: eth 1000PEPEUSDT Perpetual", 48).as_deref(), Some("1000PEPEUSDT"));
        assert_eq!(extract_symbol("no ticker here", 48), None);
    }

    #[test]
    fn test_symbol_matches_are_non_overlapping() {
        let found = find_symbol_matches("BTCUSDT 永续 xx ETHUSDT yy SOL/USDT");
        let symbols: Vec<_> = found.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]);
        assert!(found[0].0.end <= found[1].0.start);
    }

    #[test]
    fn test_side_long_checked_first_and_defaults_long() {
        assert_eq!(extract_side(SCREEN), Side::Short);
        assert_eq!(extract_side("Long then Short"), Side::Long);
        assert_eq!(extract_side("BTCUSDT 50000"), Side::Long);
        assert_eq!(detect_side("Along the way"), None);
        assert_eq!(detect_side("INJUSDT Short·Isolated"), Some(Side::Short));
    }

    #[test]
    fn test_keyword_timestamps() {
        let open = extract_open_time(SCREEN, 48).unwrap();
        let close = extract_close_time(SCREEN, 48).unwrap();
        assert_eq!((open.day(), open.hour()), (1, 10));
        assert_eq!((close.day(), close.hour(), close.minute()), (2, 12, 30));
    }

    #[test]
    fn test_unlabeled_timestamps_are_taken_in_order() {
        let text = "ETHUSDT Long 2024-05-01 08:00:00 2024-05-03 09:15:00 3000.10 3100.20";
        assert_eq!(extract_open_time(text, 48).unwrap().day(), 1);
        assert_eq!(extract_close_time(text, 48).unwrap().day(), 3);
    }

    #[test]
    fn test_prices() {
        assert_eq!(extract_open_price(SCREEN, 48), Some(50000.5));
        assert_eq!(extract_close_price(SCREEN, 48), Some(49000.25));
        // Bare integers without the quote currency are not prices
        assert_eq!(extract_open_price("Entry Price 50000", 48), None);
    }

    #[test]
    fn test_leverage_keyword_bare_and_missing() {
        assert_eq!(extract_leverage("杠杆 全仓 25倍", 48), Some(25));
        assert_eq!(extract_leverage(SCREEN, 48), Some(20));
        assert_eq!(extract_leverage("BTCUSDT 开仓价格 50000.50", 48), None);
        assert_eq!(extract_leverage("Leverage 0x", 48), None);
    }

    #[test]
    fn test_size_profit_and_rate() {
        assert_eq!(extract_position_size(SCREEN, 48), Some(0.2));
        assert_eq!(extract_profit_amount(SCREEN, 48), Some(200.05));
        let rate = extract_profit_rate(SCREEN, 48).unwrap();
        assert!((rate - 0.4002).abs() < 1e-12);
        let loose = extract_profit_rate("BTCUSDT 做空 -12.5%", 48).unwrap();
        assert!((loose + 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_leverage_keyword_without_a_value_falls_through() {
        let text = "BTCUSDT 杠杆 全仓 开仓价格 50000.00 平仓价格 51000.00 数量 3";
        assert_eq!(extract_leverage(text, 48), None);
        assert_eq!(extract_leverage("BTCUSDT 杠杆 全仓 开仓价格 50000.00 20x", 48), Some(20));
    }

    #[test]
    fn test_rate_label_is_not_a_profit_amount() {
        let text = "BTCUSDT 开仓价格 50000.00 平仓价格 51000.00 收益率 +20% 10x";
        assert_eq!(extract_profit_amount(text, 48), None);
        assert_eq!(extract_profit_amount("PnL% 15 PnL 10x", 48), None);
        assert_eq!(extract_profit_amount("盈亏率 5% 收益 -42.5 USDT", 48), Some(-42.5));
        assert_eq!(extract_position_size("数量 10x", 48), None);
        assert_eq!(extract_position_size("数量 120 XRP", 48), Some(120.0));
    }

    #[test]
    fn test_short_time_keywords_need_a_date_right_after() {
        let text = "BTCUSDT 开仓价格 50000.00 平仓价格 51000.00 平仓时间 2024-01-02 10:00:00";
        assert_eq!(extract_open_time(text, 48), None);
        assert_eq!(extract_close_time(text, 48).unwrap().day(), 2);

        let text = "Closed Vol. 0.5 Opened 2024-03-01 08:00:00 Closed 2024-03-04 09:00:00";
        assert_eq!(extract_open_time(text, 48).unwrap().day(), 1);
        assert_eq!(extract_close_time(text, 48).unwrap().day(), 4);

        // Price labels alone do not block the unlabeled fallback
        let text = "ETHUSDT 开仓价格 3000.10 平仓价格 3100.20 2024-05-01 08:00:00 2024-05-03 09:15:00";
        assert_eq!(extract_open_time(text, 48).unwrap().day(), 1);
        assert_eq!(extract_close_time(text, 48).unwrap().day(), 3);
    }

    #[test]
    fn test_normalize_symbol_cells() {
        assert_eq!(normalize_symbol("BTC-USDT-SWAP").as_deref(), Some("BTCUSDT"));
        assert_eq!(normalize_symbol("INJUSDT Short·Isolated").as_deref(), Some("INJUSDT"));
        assert_eq!(normalize_symbol("btcusdt").as_deref(), Some("BTCUSDT"));
        assert_eq!(normalize_symbol("  "), None);
    }
}
