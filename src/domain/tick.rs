//! IDX price fractions (tick grid).
//!
//! | price band     | tick |
//! |----------------|------|
//! | < 200          | 1    |
//! | 200 – < 500    | 2    |
//! | 500 – < 2000   | 5    |
//! | 2000 – < 5000  | 10   |
//! | >= 5000        | 25   |

/// Shares per exchange lot.
pub const LOT_SIZE: i64 = 100;

pub fn tick_size(price: f64) -> i64 {
    if price < 200.0 {
        1
    } else if price < 500.0 {
        2
    } else if price < 2000.0 {
        5
    } else if price < 5000.0 {
        10
    } else {
        25
    }
}

/// Round half-up to the nearest multiple of the tick for `price`'s band.
///
/// Every band boundary is a multiple of the next band's tick, so rounding is
/// idempotent even when the result crosses into the next band.
pub fn round_to_tick(price: f64) -> i64 {
    let tick = tick_size(price) as f64;
    ((price / tick + 0.5).floor() * tick) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tick_band_boundaries() {
        assert_eq!(tick_size(199.0), 1);
        assert_eq!(tick_size(200.0), 2);
        assert_eq!(tick_size(499.0), 2);
        assert_eq!(tick_size(500.0), 5);
        assert_eq!(tick_size(1999.0), 5);
        assert_eq!(tick_size(2000.0), 10);
        assert_eq!(tick_size(4999.0), 10);
        assert_eq!(tick_size(5000.0), 25);
    }

    #[test]
    fn rounds_to_band_grid() {
        assert_eq!(round_to_tick(940.0), 940);
        assert_eq!(round_to_tick(942.0), 940);
        assert_eq!(round_to_tick(943.0), 945);
        assert_eq!(round_to_tick(301.0), 302);
        assert_eq!(round_to_tick(150.4), 150);
        assert_eq!(round_to_tick(6012.0), 6000);
        assert_eq!(round_to_tick(6013.0), 6025);
    }

    #[test]
    fn half_rounds_up() {
        assert_eq!(round_to_tick(150.5), 151);
        assert_eq!(round_to_tick(2.5), 3);
        assert_eq!(round_to_tick(2505.0), 2510);
    }

    #[test]
    fn rounding_can_cross_into_next_band() {
        assert_eq!(round_to_tick(499.0), 500);
        assert_eq!(round_to_tick(4999.0), 5000);
        assert_eq!(round_to_tick(500.0), 500);
        assert_eq!(round_to_tick(5000.0), 5000);
    }

    proptest! {
        #[test]
        fn round_to_tick_is_idempotent(price in 0.0f64..100_000.0) {
            let once = round_to_tick(price);
            prop_assert_eq!(round_to_tick(once as f64), once);
        }

        #[test]
        fn rounded_price_is_on_grid(price in 0.0f64..100_000.0) {
            let rounded = round_to_tick(price);
            prop_assert_eq!(rounded % tick_size(rounded as f64), 0);
        }
    }
}
