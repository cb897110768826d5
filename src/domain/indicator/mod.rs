//! Technical indicator implementations.
//!
//! Every calculation takes an ordered bar slice and emits one point per bar.
//! A point at index `i` depends only on `bars[..=i]`, so running a calculation
//! on a truncated series yields exactly the prefix of the full-series output.
//!
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod rolling_low;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
        width: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Atr(usize),
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    RollingLow {
        window: usize,
        min_bars: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        }
    }

    /// Value at bar `index`, or `None` while the indicator is still warming up.
    pub fn value_at(&self, index: usize) -> Option<&IndicatorValue> {
        self.values
            .get(index)
            .filter(|point| point.valid)
            .map(|point| &point.value)
    }

    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.value_at(index)? {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }

    pub fn latest_simple(&self) -> Option<f64> {
        self.simple_at(self.values.len().checked_sub(1)?)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::RollingLow { window, min_bars } => {
                write!(f, "LOW({},{})", window, min_bars)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, valid: bool, v: f64) -> IndicatorPoint {
        IndicatorPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            valid,
            value: IndicatorValue::Simple(v),
        }
    }

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Ema(50).to_string(), "EMA(50)");
        assert_eq!(IndicatorType::Atr(14).to_string(), "ATR(14)");
        let boll = IndicatorType::Bollinger {
            period: 20,
            stddev_mult_x100: 200,
        };
        assert_eq!(boll.to_string(), "BOLLINGER(20,2)");
        let low = IndicatorType::RollingLow {
            window: 252,
            min_bars: 50,
        };
        assert_eq!(low.to_string(), "LOW(252,50)");
    }

    #[test]
    fn value_at_skips_warmup() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Atr(2),
            values: vec![point(1, false, 0.0), point(2, true, 4.0)],
        };
        assert_eq!(series.simple_at(0), None);
        assert_eq!(series.simple_at(1), Some(4.0));
        assert_eq!(series.simple_at(2), None);
        assert_eq!(series.latest_simple(), Some(4.0));
    }

    #[test]
    fn latest_of_empty_series() {
        let series = IndicatorSeries::empty(IndicatorType::Ema(3));
        assert_eq!(series.latest_simple(), None);
    }
}
