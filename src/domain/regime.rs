//! Broad market regime from the composite index.

use crate::domain::indicator::ema::calculate_ema;
use crate::domain::ohlcv::PriceBar;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const REGIME_EMA_PERIOD: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketRegime {
    Bullish,
    Defensive,
}

impl MarketRegime {
    /// BULLISH when the last index close is at or above its EMA-200,
    /// DEFENSIVE below it or when fewer than 200 index bars exist.
    pub fn from_index(index: &[PriceBar]) -> Self {
        if index.len() < REGIME_EMA_PERIOD {
            return MarketRegime::Defensive;
        }
        let ema = calculate_ema(index, REGIME_EMA_PERIOD);
        match (index.last(), ema.latest_simple()) {
            (Some(last), Some(ema)) if last.close >= ema => MarketRegime::Bullish,
            _ => MarketRegime::Defensive,
        }
    }

    /// Scale applied to the nominal risk budget.
    pub fn risk_multiplier(self) -> f64 {
        match self {
            MarketRegime::Bullish => 1.0,
            MarketRegime::Defensive => 0.5,
        }
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketRegime::Bullish => write!(f, "BULLISH"),
            MarketRegime::Defensive => write!(f, "DEFENSIVE"),
        }
    }
}
