//! Bollinger Bands indicator.
//!
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//! - Width: (Upper - Lower) / Middle
//!
//! StdDev is the sample standard deviation (divides by N-1).
//! Warmup: first (period-1) bars are invalid. A zero middle band makes the
//! width non-finite; consumers must treat that as "no squeeze".

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub const DEFAULT_BOLLINGER_PERIOD: usize = 20;
pub const DEFAULT_BOLLINGER_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    bars: &[PriceBar],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bollinger {
        period,
        stddev_mult_x100,
    };
    if period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let mut values = Vec::with_capacity(bars.len());
    let mult = stddev_mult_x100 as f64 / 100.0;
    let divisor = period.saturating_sub(1).max(1) as f64;

    for (i, bar) in bars.iter().enumerate() {
        let valid = i + 1 >= period;

        let value = if valid {
            let window = &bars[i + 1 - period..=i];
            let middle = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|b| {
                    let diff = b.close - middle;
                    diff * diff
                })
                .sum::<f64>()
                / divisor;
            let stddev = variance.sqrt();
            let upper = middle + mult * stddev;
            let lower = middle - mult * stddev;

            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
                width: (upper - lower) / middle,
            }
        } else {
            IndicatorValue::Bollinger {
                upper: 0.0,
                middle: 0.0,
                lower: 0.0,
                width: f64::NAN,
            }
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value,
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    fn bands(series: &IndicatorSeries, i: usize) -> (f64, f64, f64, f64) {
        match series.value_at(i) {
            Some(IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
                width,
            }) => (*upper, *middle, *lower, *width),
            other => panic!("Expected Bollinger value, got {other:?}"),
        }
    }

    #[test]
    fn bollinger_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_bollinger(&bars, 3, 200);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn bollinger_sample_stddev() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_bollinger(&bars, 3, 200);
        let (upper, middle, lower, width) = bands(&series, 2);

        // sample variance = (100 + 0 + 100) / 2 = 100 → stddev 10
        assert_relative_eq!(middle, 20.0);
        assert_relative_eq!(upper, 40.0);
        assert_relative_eq!(lower, 0.0);
        assert_relative_eq!(width, 2.0);
    }

    #[test]
    fn bollinger_constant_values_have_zero_width() {
        let bars = make_bars(&[100.0; 5]);
        let series = calculate_bollinger(&bars, 3, 200);
        let (upper, middle, lower, width) = bands(&series, 4);
        assert_relative_eq!(upper, 100.0);
        assert_relative_eq!(middle, 100.0);
        assert_relative_eq!(lower, 100.0);
        assert_relative_eq!(width, 0.0);
    }

    #[test]
    fn bollinger_zero_middle_width_not_finite() {
        let bars = make_bars(&[0.0, 0.0, 0.0]);
        let series = calculate_bollinger(&bars, 3, 200);
        let (_, _, _, width) = bands(&series, 2);
        assert!(!width.is_finite());
    }

    #[test]
    fn bollinger_symmetry() {
        let bars = make_bars(&[12.0, 17.0, 11.0, 19.0]);
        let series = calculate_bollinger(&bars, 3, 150);
        let (upper, middle, lower, _) = bands(&series, 3);
        assert_relative_eq!(upper - middle, middle - lower, epsilon = 1e-10);
    }
}
