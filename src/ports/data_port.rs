//! Market data access port trait.

use crate::domain::error::IdxQuantError;
use crate::domain::ohlcv::PriceBar;

pub trait MarketDataPort {
    /// The trailing `bars` daily bars of `ticker`, ascending by date.
    fn price_series(&self, ticker: &str, bars: usize) -> Result<Vec<PriceBar>, IdxQuantError>;

    /// The trailing `bars` daily bars of the composite index. Only `date` and
    /// `close` are required to be meaningful.
    fn market_index_series(&self, bars: usize) -> Result<Vec<PriceBar>, IdxQuantError>;
}
