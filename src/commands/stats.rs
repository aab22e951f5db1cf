use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{EquityPoint, PerformanceSummary, TradeRecord, TradeStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurvePoint {
    pub date: String,
    pub cumulative_pnl: f64,
    pub daily_pnl: f64,
    pub trade_count: i32,
}

/// Summary and curve computed from one record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub summary: PerformanceSummary,
    pub equity_curve: Vec<EquityPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateRange {
    Today,
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
    #[default]
    All,
}

impl FromStr for DateRange {
    type Err = std::convert::Infallible;

    /// Unknown values mean no filtering
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "today" => DateRange::Today,
            "week" => DateRange::Week,
            "month" => DateRange::Month,
            "3months" => DateRange::ThreeMonths,
            "6months" => DateRange::SixMonths,
            "year" => DateRange::Year,
            _ => DateRange::All,
        })
    }
}

impl DateRange {
    /// Earliest close time included in the range
    pub fn threshold(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            DateRange::Today => now.date_naive().and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            DateRange::Week => Some(now - Duration::days(7)),
            DateRange::Month => Some(now - Duration::days(30)),
            DateRange::ThreeMonths => Some(now - Duration::days(90)),
            DateRange::SixMonths => Some(now - Duration::days(180)),
            DateRange::Year => Some(now - Duration::days(365)),
            DateRange::All => None,
        }
    }
}

/// Keep trades closed inside the range; undated trades only survive `All`
pub fn filter_by_date_range(trades: &[TradeRecord], range: DateRange, now: DateTime<Utc>) -> Vec<TradeRecord> {
    match range.threshold(now) {
        None => trades.to_vec(),
        Some(threshold) => trades
            .iter()
            .filter(|t| t.close_time.is_some_and(|close| close >= threshold))
            .cloned()
            .collect(),
    }
}

/// Dated trades in ascending close-time order. The sort is stable so equal
/// close times keep their input order.
fn sorted_by_close(trades: &[TradeRecord]) -> Vec<(DateTime<Utc>, f64)> {
    let mut dated: Vec<(DateTime<Utc>, f64)> = trades
        .iter()
        .filter_map(|t| t.close_time.map(|close| (close, t.profit_amount)))
        .collect();
    dated.sort_by_key(|(close, _)| *close);
    dated
}

/// Baseline point at the first close time, then one point per dated trade.
/// Empty when no trade has a close time.
pub fn compute_equity_curve(trades: &[TradeRecord], initial_equity: f64) -> Vec<EquityPoint> {
    let dated = sorted_by_close(trades);
    let Some((first_close, _)) = dated.first() else {
        return Vec::new();
    };

    let mut curve = Vec::with_capacity(dated.len() + 1);
    curve.push(EquityPoint {
        timestamp: *first_close,
        equity: initial_equity,
    });

    let mut equity = initial_equity;
    for (close, pnl) in dated {
        equity += pnl;
        curve.push(EquityPoint {
            timestamp: close,
            equity,
        });
    }
    curve
}

/// Largest `(peak - equity) / peak` over a forward pass
pub fn compute_max_drawdown(curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_drawdown: f64 = 0.0;

    for point in curve {
        if point.equity > peak {
            peak = point.equity;
        }
        if peak > 0.0 {
            max_drawdown = max_drawdown.max((peak - point.equity) / peak);
        }
    }
    max_drawdown
}

pub fn analyze_performance(trades: &[TradeRecord], initial_equity: f64) -> PerformanceReport {
    let equity_curve = compute_equity_curve(trades, initial_equity);
    let summary = summarize(trades, initial_equity, &equity_curve);
    PerformanceReport { summary, equity_curve }
}

pub fn get_performance_summary(trades: &[TradeRecord], initial_equity: f64) -> PerformanceSummary {
    analyze_performance(trades, initial_equity).summary
}

/// Dashboard view: filter by range, then summarize
pub fn get_dashboard_stats(
    trades: &[TradeRecord],
    initial_equity: f64,
    range: DateRange,
    now: DateTime<Utc>,
) -> PerformanceReport {
    analyze_performance(&filter_by_date_range(trades, range, now), initial_equity)
}

fn summarize(trades: &[TradeRecord], initial_equity: f64, curve: &[EquityPoint]) -> PerformanceSummary {
    let mut summary = PerformanceSummary {
        initial_equity,
        current_equity: initial_equity,
        trade_count: trades.len(),
        ..Default::default()
    };
    if trades.is_empty() {
        return summary;
    }

    let mut best = f64::NEG_INFINITY;
    let mut worst = f64::INFINITY;

    for trade in trades {
        let pnl = trade.profit_amount;
        summary.total_profit += pnl;
        best = best.max(pnl);
        worst = worst.min(pnl);

        match trade.status() {
            TradeStatus::Win => {
                summary.wins += 1;
                summary.gross_profit += pnl;
            }
            TradeStatus::Loss => {
                summary.losses += 1;
                summary.gross_loss += pnl.abs();
            }
            TradeStatus::Breakeven => summary.breakevens += 1,
        }
    }

    summary.current_equity = initial_equity + summary.total_profit;
    summary.best_trade = best;
    summary.worst_trade = worst;
    summary.win_rate = summary.wins as f64 / summary.trade_count as f64;

    if summary.wins > 0 {
        summary.average_win = summary.gross_profit / summary.wins as f64;
    }
    if summary.losses > 0 {
        summary.average_loss = summary.gross_loss / summary.losses as f64;
    }
    if summary.average_loss > 0.0 {
        summary.profit_loss_ratio = summary.average_win / summary.average_loss;
    }

    summary.profit_factor = if summary.gross_loss > 0.0 {
        summary.gross_profit / summary.gross_loss
    } else if summary.gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    summary.max_drawdown = compute_max_drawdown(curve);
    summary
}

/// P&L grouped by UTC close date with a running total
pub fn get_daily_equity_curve(trades: &[TradeRecord]) -> Vec<EquityCurvePoint> {
    let mut daily_map: BTreeMap<String, (f64, i32)> = BTreeMap::new();

    for (close, pnl) in sorted_by_close(trades) {
        let entry = daily_map.entry(close.format("%Y-%m-%d").to_string()).or_insert((0.0, 0));
        entry.0 += pnl;
        entry.1 += 1;
    }

    let mut cumulative_pnl = 0.0;
    daily_map
        .into_iter()
        .map(|(date, (daily_pnl, trade_count))| {
            cumulative_pnl += daily_pnl;
            EquityCurvePoint {
                date,
                cumulative_pnl,
                daily_pnl,
                trade_count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Side, TradeSource};
    use chrono::TimeZone;

    fn trade(day: u32, pnl: f64) -> TradeRecord {
        let close = Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap();
        TradeRecord {
            symbol: "BTCUSDT".to_string(),
            side: Side::Long,
            open_time: Some(close),
            close_time: Some(close),
            open_price: 100.0,
            close_price: 100.0 + pnl,
            leverage: 10,
            position_size: 1.0,
            profit_amount: pnl,
            profit_rate: pnl / 100.0 * 10.0,
            source: TradeSource::Manual,
        }
    }

    #[test]
    fn test_empty_input() {
        let report = analyze_performance(&[], 5000.0);
        assert!(report.equity_curve.is_empty());

        let s = report.summary;
        assert_eq!(s.trade_count, 0);
        assert_eq!(s.total_profit, 0.0);
        assert_eq!(s.win_rate, 0.0);
        assert_eq!(s.profit_loss_ratio, 0.0);
        assert_eq!(s.max_drawdown, 0.0);
        assert_eq!(s.average_win, 0.0);
        assert_eq!(s.average_loss, 0.0);
        assert_eq!(s.current_equity, 5000.0);
    }

    #[test]
    fn test_equity_curve_is_sorted_with_baseline() {
        // Out of order on purpose
        let trades = vec![trade(3, -700.0), trade(2, 500.0), trade(5, -2000.0), trade(4, 1200.0)];
        let curve = compute_equity_curve(&trades, 10000.0);

        let equities: Vec<f64> = curve.iter().map(|p| p.equity).collect();
        assert_eq!(equities, vec![10000.0, 10500.0, 9800.0, 11000.0, 9000.0]);
        assert_eq!(curve[0].timestamp, curve[1].timestamp);
        assert!(curve.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_max_drawdown_uses_running_peak() {
        let trades = vec![trade(2, 500.0), trade(3, -700.0), trade(4, 1200.0), trade(5, -2000.0)];
        let summary = get_performance_summary(&trades, 10000.0);
        // Peak 11000 then 9000
        assert!((summary.max_drawdown - 2000.0 / 11000.0).abs() < 1e-9);
    }

    #[test]
    fn test_drawdown_without_new_high() {
        let trades = vec![trade(2, 500.0), trade(3, -700.0), trade(4, -800.0)];
        let summary = get_performance_summary(&trades, 10000.0);
        assert!((summary.max_drawdown - 1500.0 / 10500.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregates() {
        let trades = vec![trade(2, 300.0), trade(3, -100.0), trade(4, 100.0), trade(5, 0.0), trade(6, -300.0)];
        let s = get_performance_summary(&trades, 1000.0);

        assert_eq!(s.trade_count, 5);
        assert_eq!((s.wins, s.losses, s.breakevens), (2, 2, 1));
        assert!((s.win_rate - 0.4).abs() < 1e-12);
        assert!((s.average_win - 200.0).abs() < 1e-9);
        assert!((s.average_loss - 200.0).abs() < 1e-9);
        assert!((s.profit_loss_ratio - 1.0).abs() < 1e-9);
        assert!((s.total_profit - 0.0).abs() < 1e-9);
        assert!((s.current_equity - s.initial_equity - s.total_profit).abs() < 1e-9);
        assert_eq!(s.best_trade, 300.0);
        assert_eq!(s.worst_trade, -300.0);
        assert!((s.profit_factor - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_losses() {
        let s = get_performance_summary(&[trade(2, 50.0)], 1000.0);
        assert_eq!(s.profit_loss_ratio, 0.0);
        assert!(s.profit_factor.is_infinite());
        assert_eq!(s.win_rate, 1.0);
    }

    #[test]
    fn test_undated_trades_count_but_skip_curve() {
        let mut undated = trade(2, 40.0);
        undated.close_time = None;
        let report = analyze_performance(&[undated, trade(3, 10.0)], 100.0);

        assert_eq!(report.summary.trade_count, 2);
        assert!((report.summary.current_equity - 150.0).abs() < 1e-9);
        assert_eq!(report.equity_curve.len(), 2);
        assert!((report.equity_curve[1].equity - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let trades = vec![trade(4, 12.5), trade(2, -3.0), trade(3, 7.25)];
        assert_eq!(analyze_performance(&trades, 2500.0), analyze_performance(&trades, 2500.0));
    }

    #[test]
    fn test_date_range_filter() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let trades = vec![trade(1, 1.0), trade(5, 2.0), trade(9, 3.0)];

        assert_eq!(filter_by_date_range(&trades, DateRange::Week, now).len(), 2);
        assert_eq!(filter_by_date_range(&trades, DateRange::All, now).len(), 3);
        assert_eq!("3months".parse::<DateRange>().unwrap(), DateRange::ThreeMonths);
        assert_eq!("bogus".parse::<DateRange>().unwrap(), DateRange::All);

        let report = get_dashboard_stats(&trades, 100.0, DateRange::Week, now);
        assert!((report.summary.total_profit - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_curve_groups_by_date() {
        let mut late = trade(2, 5.0);
        late.close_time = Some(Utc.with_ymd_and_hms(2024, 1, 2, 23, 0, 0).unwrap());
        let daily = get_daily_equity_curve(&[trade(3, -1.0), trade(2, 2.0), late]);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, "2024-01-02");
        assert_eq!(daily[0].trade_count, 2);
        assert!((daily[0].daily_pnl - 7.0).abs() < 1e-9);
        assert!((daily[1].cumulative_pnl - 6.0).abs() < 1e-9);
    }
}
