//! Trailing minimum of the low price ("52-week low").
//!
//! The window grows from the first bar until it spans `window` bars, then
//! slides. Points are invalid until `min_bars` bars exist.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub const YEAR_LOW_WINDOW: usize = 252;
pub const YEAR_LOW_MIN_BARS: usize = 50;

pub fn calculate_rolling_low(bars: &[PriceBar], window: usize, min_bars: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::RollingLow { window, min_bars };
    if window == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let start = (i + 1).saturating_sub(window);
            let low = bars[start..=i]
                .iter()
                .map(|b| b.low)
                .fold(f64::INFINITY, f64::min);
            IndicatorPoint {
                date: bar.date,
                valid: i + 1 >= min_bars,
                value: IndicatorValue::Simple(low),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}
