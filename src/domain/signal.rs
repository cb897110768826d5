//! Entry strategies combining trend/volatility structure with broker flow.
//!
//! Stage 2 Breakout: close > EMA(50) > EMA(150), accumulation ratio > 1.5 and
//! a top buyer outside the retail set. Needs 150 bars.
//!
//! Silent Accumulation: Bollinger width < 0.15, close within 15% of the
//! 52-week low, accumulation ratio > 2.0 and a smart-money top buyer.
//! Needs 252 bars.

use crate::domain::broker::{BrokerClassification, BrokerSnapshot};
use crate::domain::indicator_set::IndicatorSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BREAKOUT_MIN_HISTORY: usize = 150;
pub const BREAKOUT_MIN_RATIO: f64 = 1.5;

pub const ACCUMULATION_MIN_HISTORY: usize = 252;
pub const ACCUMULATION_MIN_RATIO: f64 = 2.0;
pub const SQUEEZE_MAX_WIDTH: f64 = 0.15;
pub const NEAR_LOW_FACTOR: f64 = 1.15;

const NOT_EVALUATED_BUYER: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    #[serde(rename = "Stage 2 Breakout")]
    Breakout,
    #[serde(rename = "Silent Accumulation")]
    Accumulation,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Breakout => write!(f, "Stage 2 Breakout"),
            StrategyKind::Accumulation => write!(f, "Silent Accumulation"),
        }
    }
}

/// Outcome of one strategy, with the broker-flow inputs it looked at.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySignal {
    pub fired: bool,
    pub accumulation_ratio: f64,
    pub top_buyer: String,
}

impl StrategySignal {
    fn not_evaluated() -> Self {
        StrategySignal {
            fired: false,
            accumulation_ratio: 0.0,
            top_buyer: NOT_EVALUATED_BUYER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntrySignal {
    pub breakout: StrategySignal,
    pub accumulation: StrategySignal,
}

impl EntrySignal {
    /// The strategy that fired, breakout first when both did.
    pub fn triggered(&self) -> Option<StrategyKind> {
        if self.breakout.fired {
            Some(StrategyKind::Breakout)
        } else if self.accumulation.fired {
            Some(StrategyKind::Accumulation)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    brokers: BrokerClassification,
}

impl SignalEngine {
    pub fn new(brokers: BrokerClassification) -> Self {
        SignalEngine { brokers }
    }

    pub fn evaluate(&self, bar: &IndicatorSnapshot, flow: &BrokerSnapshot) -> EntrySignal {
        EntrySignal {
            breakout: self.breakout(bar, flow),
            accumulation: self.accumulation(bar, flow),
        }
    }

    pub fn breakout(&self, bar: &IndicatorSnapshot, flow: &BrokerSnapshot) -> StrategySignal {
        if bar.history < BREAKOUT_MIN_HISTORY {
            return StrategySignal::not_evaluated();
        }

        let uptrend = match (bar.ema_fast, bar.ema_slow) {
            (Some(fast), Some(slow)) => bar.close > fast && fast > slow,
            _ => false,
        };
        let accumulating = flow.accumulation_ratio > BREAKOUT_MIN_RATIO;
        let not_retail = !self.brokers.is_retail(&flow.top_buyer);

        StrategySignal {
            fired: uptrend && accumulating && not_retail,
            accumulation_ratio: flow.accumulation_ratio,
            top_buyer: flow.top_buyer.clone(),
        }
    }

    pub fn accumulation(&self, bar: &IndicatorSnapshot, flow: &BrokerSnapshot) -> StrategySignal {
        if bar.history < ACCUMULATION_MIN_HISTORY {
            return StrategySignal::not_evaluated();
        }

        let squeeze = bar
            .bb_width
            .is_some_and(|width| width.is_finite() && width < SQUEEZE_MAX_WIDTH);
        let near_low = bar
            .year_low
            .is_some_and(|low| bar.close < NEAR_LOW_FACTOR * low);
        let strong_accumulation = flow.accumulation_ratio > ACCUMULATION_MIN_RATIO;
        let smart_money = self.brokers.is_smart_money(&flow.top_buyer);

        StrategySignal {
            fired: squeeze && near_low && strong_accumulation && smart_money,
            accumulation_ratio: flow.accumulation_ratio,
            top_buyer: flow.top_buyer.clone(),
        }
    }
}
