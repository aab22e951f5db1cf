use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{RawTrade, Settings, Side, TradeRecord, TradeSource};
use crate::validate::{normalize_trade, TradeDefaults};

/// Hand-entered trade. Profit fields are always computed from the prices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTradeInput {
    pub symbol: String,
    pub side: Side,
    pub open_time: Option<DateTime<Utc>>,
    pub close_time: Option<DateTime<Utc>>,
    pub open_price: f64,
    pub close_price: f64,
    pub leverage: Option<u32>,
    pub position_size: f64,
}

pub fn create_trade(input: CreateTradeInput, settings: &Settings) -> Result<TradeRecord, String> {
    create_trade_at(input, settings, Utc::now())
}

/// Same as [`create_trade`] with a fixed fallback timestamp
pub fn create_trade_at(input: CreateTradeInput, settings: &Settings, now: DateTime<Utc>) -> Result<TradeRecord, String> {
    let symbol = input.symbol.clone();
    let raw = RawTrade {
        symbol: Some(input.symbol),
        side: Some(input.side),
        open_time: input.open_time,
        close_time: input.close_time,
        open_price: Some(input.open_price),
        close_price: Some(input.close_price),
        leverage: input.leverage,
        position_size: Some(input.position_size),
        profit_amount: None,
        profit_rate: None,
        source: Some(TradeSource::Manual),
    };

    let defaults = TradeDefaults {
        default_leverage: settings.default_leverage,
        ..TradeDefaults::new(TradeSource::Manual, now)
    };

    let trade = normalize_trade(raw, &defaults)
        .ok_or_else(|| format!("Invalid trade {:?}: symbol and both prices are required", symbol))?;
    log::info!("Created manual {} trade on {}", trade.side.as_str(), trade.symbol);
    Ok(trade)
}

/// Copy of an existing trade re-run through validation as a manual entry
pub fn duplicate_trade(trade: &TradeRecord, settings: &Settings) -> Result<TradeRecord, String> {
    create_trade(
        CreateTradeInput {
            symbol: trade.symbol.clone(),
            side: trade.side,
            open_time: trade.open_time,
            close_time: trade.close_time,
            open_price: trade.open_price,
            close_price: trade.close_price,
            leverage: Some(trade.leverage),
            position_size: trade.position_size,
        },
        settings,
    )
}
