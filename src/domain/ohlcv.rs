//! Daily price bar representation.

use chrono::NaiveDate;

/// One trading day of a ticker or index. A `PriceSeries` is a `&[PriceBar]`
/// ordered by strictly increasing date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Bars of `series` dated on or before `date`.
pub fn prefix_until(series: &[PriceBar], date: NaiveDate) -> &[PriceBar] {
    let end = series.partition_point(|bar| bar.date <= date);
    &series[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        // high-low=20, |high-100|=10, |low-100|=10 → 20
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        // high-low=20, |110-130|=20, |90-130|=40 → 40
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn prefix_until_is_inclusive() {
        let bars: Vec<PriceBar> = (1..=5)
            .map(|d| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                ..sample_bar()
            })
            .collect();

        let prefix = prefix_until(&bars, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(prefix.len(), 3);

        let before = prefix_until(&bars, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert!(before.is_empty());

        let after = prefix_until(&bars, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(after.len(), 5);
    }
}
