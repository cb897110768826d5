//! Average True Range with Wilder smoothing.
//!
//! TR[0] = high - low (no previous close); TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! ATR[0] = TR[0], ATR[i] = ATR[i-1] + (TR[i] - ATR[i-1]) / n.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub const DEFAULT_ATR_PERIOD: usize = 14;

pub fn calculate_atr(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Atr(period));
    }

    let alpha = 1.0 / period as f64;
    let mut values = Vec::with_capacity(bars.len());
    let mut atr = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.high - bar.low
        } else {
            bar.true_range(bars[i - 1].close)
        };
        atr = if i == 0 { tr } else { atr + alpha * (tr - atr) };

        values.push(IndicatorPoint {
            date: bar.date,
            valid: i + 1 >= period,
            value: IndicatorValue::Simple(atr),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn atr_warmup() {
        let bars: Vec<PriceBar> = (1..=5).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calculate_atr(&bars, 3);

        assert_eq!(series.values.len(), 5);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn atr_constant_range() {
        let bars: Vec<PriceBar> = (1..=5).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calculate_atr(&bars, 3);
        assert_relative_eq!(series.latest_simple().unwrap(), 20.0);
    }

    #[test]
    fn atr_wilder_recursion() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 115.0, 105.0, 110.0),
            make_bar(3, 130.0, 112.0, 125.0),
        ];
        let series = calculate_atr(&bars, 2);

        // TR: 10, max(10, 10, 0)=10, max(18, 20, 2)=20
        let a0 = 10.0;
        let a1 = a0 + 0.5 * (10.0 - a0);
        let a2 = a1 + 0.5 * (20.0 - a1);
        assert_eq!(series.simple_at(0), None);
        assert_relative_eq!(series.simple_at(1).unwrap(), a1);
        assert_relative_eq!(series.simple_at(2).unwrap(), a2);
    }

    #[test]
    fn atr_too_few_bars_has_no_value() {
        let bars: Vec<PriceBar> = (1..=3).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calculate_atr(&bars, DEFAULT_ATR_PERIOD);
        assert_eq!(series.values.len(), 3);
        assert_eq!(series.latest_simple(), None);
    }

    #[test]
    fn atr_empty_and_zero_period() {
        assert!(calculate_atr(&[], 14).values.is_empty());
        let bars = vec![make_bar(1, 110.0, 90.0, 100.0)];
        assert!(calculate_atr(&bars, 0).values.is_empty());
    }
}
