//! Open position and trade audit records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::signal::StrategyKind;

/// A long holding. The simulator keeps at most one per ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ticker: String,
    pub shares: i64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub initial_stop: i64,
    pub strategy: StrategyKind,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares as f64 * (price - self.entry_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// One fill. SELL records carry the P&L realized against the matching BUY.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub ticker: String,
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub shares: i64,
    pub pnl: Option<f64>,
}
