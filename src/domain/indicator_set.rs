//! The indicator bundle the strategies read.
//!
//! `IndicatorSet::compute` always runs every calculation over the exact slice
//! it is given. The simulator hands it `bars[..=i]` on day `i`, so nothing
//! after day `i` can leak into that day's decision.

use crate::domain::indicator::atr::{calculate_atr, DEFAULT_ATR_PERIOD};
use crate::domain::indicator::bollinger::{
    calculate_bollinger, DEFAULT_BOLLINGER_MULT_X100, DEFAULT_BOLLINGER_PERIOD,
};
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::rolling_low::{
    calculate_rolling_low, YEAR_LOW_MIN_BARS, YEAR_LOW_WINDOW,
};
use crate::domain::indicator::{IndicatorSeries, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub const EMA_FAST_PERIOD: usize = 50;
pub const EMA_SLOW_PERIOD: usize = 150;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub close: Vec<f64>,
    pub ema_fast: IndicatorSeries,
    pub ema_slow: IndicatorSeries,
    pub bollinger: IndicatorSeries,
    pub year_low: IndicatorSeries,
    pub atr: IndicatorSeries,
}

/// Indicator values at a single bar. `None` means the indicator is still
/// warming up at that bar.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    /// Number of bars of history up to and including this one.
    pub history: usize,
    pub close: f64,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_width: Option<f64>,
    pub year_low: Option<f64>,
    pub atr: Option<f64>,
}

impl IndicatorSet {
    pub fn compute(bars: &[PriceBar]) -> Self {
        IndicatorSet {
            close: bars.iter().map(|b| b.close).collect(),
            ema_fast: calculate_ema(bars, EMA_FAST_PERIOD),
            ema_slow: calculate_ema(bars, EMA_SLOW_PERIOD),
            bollinger: calculate_bollinger(
                bars,
                DEFAULT_BOLLINGER_PERIOD,
                DEFAULT_BOLLINGER_MULT_X100,
            ),
            year_low: calculate_rolling_low(bars, YEAR_LOW_WINDOW, YEAR_LOW_MIN_BARS),
            atr: calculate_atr(bars, DEFAULT_ATR_PERIOD),
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<IndicatorSnapshot> {
        let close = *self.close.get(index)?;
        let (bb_upper, bb_lower, bb_width) = match self.bollinger.value_at(index) {
            Some(IndicatorValue::Bollinger {
                upper,
                lower,
                width,
                ..
            }) => (Some(*upper), Some(*lower), Some(*width)),
            _ => (None, None, None),
        };

        Some(IndicatorSnapshot {
            history: index + 1,
            close,
            ema_fast: self.ema_fast.simple_at(index),
            ema_slow: self.ema_slow.simple_at(index),
            bb_upper,
            bb_lower,
            bb_width,
            year_low: self.year_low.simple_at(index),
            atr: self.atr.simple_at(index),
        })
    }

    pub fn latest(&self) -> Option<IndicatorSnapshot> {
        self.at(self.len().checked_sub(1)?)
    }
}
