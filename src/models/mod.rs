use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Broker retcode for a completed request (TRADE_RETCODE_DONE)
pub const RETCODE_DONE: u32 = 10009;

/// OHLC candle as returned by the terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub tick_volume: u64,
}

/// Live bid/ask pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Price we would pay (BUY) or receive (SELL) right now
    pub fn entry_price(&self, side: OrderSide) -> f64 {
        match side {
            OrderSide::Buy => self.ask,
            OrderSide::Sell => self.bid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountState {
    pub equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// MT5 ORDER_TYPE_BUY / ORDER_TYPE_SELL
    pub fn order_type(&self) -> u32 {
        match self {
            OrderSide::Buy => 0,
            OrderSide::Sell => 1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Terminal chart timeframe, parsed case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Timeframe {
    M1,
    M5,
    M10,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn minutes(&self) -> u32 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M10 => 10,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "M1" => Ok(Timeframe::M1),
            "M5" => Ok(Timeframe::M5),
            "M10" => Ok(Timeframe::M10),
            "M15" => Ok(Timeframe::M15),
            "M30" => Ok(Timeframe::M30),
            "H1" => Ok(Timeframe::H1),
            "H4" => Ok(Timeframe::H4),
            "D1" => Ok(Timeframe::D1),
            other => Err(format!("unknown timeframe '{}'", other)),
        }
    }
}

impl TryFrom<String> for Timeframe {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Open position as reported by the terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticket: u64,
    pub symbol: String,
    pub volume: f64,
    pub price_open: f64,
    #[serde(default)]
    pub magic: u64,
}

/// Pending order as reported by the terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub ticket: u64,
    pub symbol: String,
    pub volume_current: f64,
    pub price_open: f64,
    #[serde(default)]
    pub magic: u64,
}

/// Trading properties of an instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub visible: bool,
    pub volume_min: f64,
    pub volume_max: f64,
    #[serde(default)]
    pub volume_step: f64,
}

/// Open exposure on the traded symbol, fetched fresh every cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionSnapshot {
    pub open_positions: usize,
    pub open_orders: usize,
}

impl PositionSnapshot {
    pub fn active_count(&self) -> usize {
        self.open_positions + self.open_orders
    }
}

/// What the cycle wants to trade; built fresh and consumed immediately
#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: OrderSide,
    pub volume: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub tag: u64,
    pub comment: String,
}

/// Wire form of a market order (TRADE_ACTION_DEAL, GTC, IOC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub action: u32,
    pub symbol: String,
    pub volume: f64,
    #[serde(rename = "type")]
    pub order_type: u32,
    pub price: f64,
    pub sl: f64,
    pub tp: f64,
    pub magic: u64,
    pub comment: String,
    pub type_time: u32,
    pub type_filling: u32,
}

impl OrderRequest {
    const TRADE_ACTION_DEAL: u32 = 1;
    const ORDER_TIME_GTC: u32 = 0;
    const ORDER_FILLING_IOC: u32 = 1;

    pub fn market(intent: &OrderIntent) -> Self {
        Self {
            action: Self::TRADE_ACTION_DEAL,
            symbol: intent.symbol.clone(),
            volume: intent.volume,
            order_type: intent.side.order_type(),
            price: intent.entry_price,
            sl: intent.stop_loss,
            tp: intent.take_profit,
            magic: intent.tag,
            comment: intent.comment.clone(),
            type_time: Self::ORDER_TIME_GTC,
            type_filling: Self::ORDER_FILLING_IOC,
        }
    }
}

/// Result of an order submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub retcode: u32,
    #[serde(default)]
    pub order: u64,
    #[serde(default)]
    pub deal: u64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub comment: String,
}
