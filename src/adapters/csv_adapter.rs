//! CSV file data adapter.
//!
//! Layout under the data directory:
//! - `<TICKER>.csv`: `date,open,high,low,close,volume`
//! - `<INDEX_CODE>.csv`: same format, the composite index
//! - `<TICKER>_broker.csv`: `date,top_buyer,acc_ratio`

use crate::domain::broker::BrokerSnapshot;
use crate::domain::error::IdxQuantError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::broker_port::BrokerFlowPort;
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct BrokerRow {
    date: NaiveDate,
    top_buyer: String,
    acc_ratio: f64,
}

pub struct CsvAdapter {
    base_path: PathBuf,
    index_code: String,
    broker_cache: Mutex<HashMap<String, Arc<Vec<BrokerRow>>>>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf, index_code: &str) -> Self {
        Self {
            base_path,
            index_code: index_code.to_string(),
            broker_cache: Mutex::new(HashMap::new()),
        }
    }

    fn price_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }

    fn broker_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}_broker.csv"))
    }

    fn load_prices(&self, ticker: &str, bars: usize) -> Result<Vec<PriceBar>, IdxQuantError> {
        let path = self.price_path(ticker);
        let Some(content) = read_optional(&path)? else {
            return Err(IdxQuantError::NoData {
                ticker: ticker.to_string(),
            });
        };

        let mut series = parse_rows::<PriceRow>(&content, &path)?
            .into_iter()
            .map(|row| PriceBar {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            })
            .collect::<Vec<_>>();
        series.sort_by_key(|b| b.date);
        series.dedup_by_key(|b| b.date);

        let start = series.len().saturating_sub(bars);
        series.drain(..start);
        tracing::debug!(ticker, bars = series.len(), path = %path.display(), "loaded price series");
        Ok(series)
    }

    fn broker_history(&self, ticker: &str) -> Result<Arc<Vec<BrokerRow>>, IdxQuantError> {
        let mut cache = self.broker_cache.lock().map_err(|_| IdxQuantError::Data {
            reason: "broker cache lock poisoned".into(),
        })?;
        if let Some(rows) = cache.get(ticker) {
            return Ok(Arc::clone(rows));
        }

        let path = self.broker_path(ticker);
        let mut rows = match read_optional(&path)? {
            Some(content) => parse_rows::<BrokerRow>(&content, &path)?,
            None => Vec::new(),
        };
        rows.sort_by_key(|r| r.date);

        let rows = Arc::new(rows);
        cache.insert(ticker.to_string(), Arc::clone(&rows));
        Ok(rows)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, IdxQuantError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(IdxQuantError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        }),
    }
}

fn parse_rows<T: serde::de::DeserializeOwned>(
    content: &str,
    path: &Path,
) -> Result<Vec<T>, IdxQuantError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    rdr.deserialize()
        .map(|row| {
            row.map_err(|e| IdxQuantError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })
        })
        .collect()
}

impl MarketDataPort for CsvAdapter {
    fn price_series(&self, ticker: &str, bars: usize) -> Result<Vec<PriceBar>, IdxQuantError> {
        self.load_prices(ticker, bars)
    }

    fn market_index_series(&self, bars: usize) -> Result<Vec<PriceBar>, IdxQuantError> {
        self.load_prices(&self.index_code, bars)
    }
}

impl BrokerFlowPort for CsvAdapter {
    fn snapshot(
        &self,
        ticker: &str,
        date: Option<NaiveDate>,
    ) -> Result<Option<BrokerSnapshot>, IdxQuantError> {
        let rows = self.broker_history(ticker)?;
        let row = match date {
            Some(date) => rows
                .binary_search_by_key(&date, |r| r.date)
                .ok()
                .map(|i| &rows[i]),
            None => rows.last(),
        };
        Ok(row.map(|r| BrokerSnapshot::new(r.acc_ratio, r.top_buyer.trim().to_uppercase(), r.date)))
    }
}
