#![allow(dead_code)]

use chrono::NaiveDate;
use idxquant::domain::app_config::AppConfig;
use idxquant::domain::backtest::{BacktestConfig, BrokerSource};
use idxquant::domain::broker::{BrokerClassification, BrokerSnapshot};
use idxquant::domain::error::IdxQuantError;
pub use idxquant::domain::ohlcv::PriceBar;
use idxquant::domain::risk::RiskConfig;
use idxquant::ports::broker_port::BrokerFlowPort;
use idxquant::ports::data_port::MarketDataPort;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub index: Vec<PriceBar>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            index: Vec::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_index(mut self, bars: Vec<PriceBar>) -> Self {
        self.index = bars;
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

fn trailing(series: &[PriceBar], bars: usize) -> Vec<PriceBar> {
    series[series.len().saturating_sub(bars)..].to_vec()
}

impl MarketDataPort for MockDataPort {
    fn price_series(&self, ticker: &str, bars: usize) -> Result<Vec<PriceBar>, IdxQuantError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(IdxQuantError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(ticker) {
            Some(series) => Ok(trailing(series, bars)),
            None => Err(IdxQuantError::NoData {
                ticker: ticker.to_string(),
            }),
        }
    }

    fn market_index_series(&self, bars: usize) -> Result<Vec<PriceBar>, IdxQuantError> {
        Ok(trailing(&self.index, bars))
    }
}

/// Broker history keyed by ticker and date, counting every lookup.
pub struct MockBrokerPort {
    pub history: HashMap<String, Vec<BrokerSnapshot>>,
    pub calls: AtomicUsize,
}

impl MockBrokerPort {
    pub fn new() -> Self {
        Self {
            history: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_snapshot(mut self, ticker: &str, snapshot: BrokerSnapshot) -> Self {
        self.history
            .entry(ticker.to_string())
            .or_default()
            .push(snapshot);
        self
    }

    /// The same ratio and buyer on every date of `bars`.
    pub fn with_constant_flow(
        mut self,
        ticker: &str,
        bars: &[PriceBar],
        ratio: f64,
        buyer: &str,
    ) -> Self {
        let rows = bars
            .iter()
            .map(|b| BrokerSnapshot::new(ratio, buyer, b.date))
            .collect();
        self.history.insert(ticker.to_string(), rows);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BrokerFlowPort for MockBrokerPort {
    fn snapshot(
        &self,
        ticker: &str,
        date: Option<NaiveDate>,
    ) -> Result<Option<BrokerSnapshot>, IdxQuantError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(rows) = self.history.get(ticker) else {
            return Ok(None);
        };
        Ok(match date {
            Some(date) => rows.iter().find(|s| s.as_of == Some(date)).cloned(),
            None => rows.iter().max_by_key(|s| s.as_of).cloned(),
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(day: NaiveDate, close: f64) -> PriceBar {
    PriceBar {
        date: day,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 100_000,
    }
}

/// One bar per calendar day from `start`, one per close.
pub fn bars_from_closes(start: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(start + chrono::Duration::days(i as i64), close))
        .collect()
}

/// Steady uptrend: `start_price + step * i`.
pub fn generate_bars(start: NaiveDate, count: usize, start_price: f64, step: f64) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + step * i as f64).collect();
    bars_from_closes(start, &closes)
}

/// Uptrend for `rise` bars, then `flat` bars pinned far below the trend.
pub fn rise_then_crash(start: NaiveDate, rise: usize, flat: usize) -> Vec<PriceBar> {
    let mut closes: Vec<f64> = (0..rise).map(|i| 1000.0 + 5.0 * i as f64).collect();
    closes.extend(std::iter::repeat_n(1200.0, flat));
    bars_from_closes(start, &closes)
}

/// Steady decline of `decline` bars from 2000 towards 1000, then `range`
/// bars alternating 1002 / 998.
pub fn decline_then_range(start: NaiveDate, decline: usize, range: usize) -> Vec<PriceBar> {
    let mut closes: Vec<f64> = (0..decline).map(|i| 2000.0 - 5.0 * i as f64).collect();
    closes.extend((0..range).map(|i| if i % 2 == 0 { 1002.0 } else { 998.0 }));
    bars_from_closes(start, &closes)
}

pub fn sample_config() -> AppConfig {
    AppConfig {
        backtest: BacktestConfig {
            initial_capital: 100_000_000.0,
            history_bars: 500,
            broker_source: BrokerSource::Historical,
            broker_timeout_ms: 2_000,
        },
        risk: RiskConfig::default(),
        brokers: BrokerClassification::default(),
        watchlist: vec!["BBCA".into(), "TLKM".into()],
        data_dir: PathBuf::from("data"),
        index_code: "COMPOSITE".into(),
        audit_path: PathBuf::from("trade_logs.json"),
    }
}

/// CSV text in the on-disk price format.
pub fn price_csv(bars: &[PriceBar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}

/// CSV text in the on-disk broker-history format.
pub fn broker_csv(bars: &[PriceBar], buyer: &str, ratio: f64) -> String {
    let mut out = String::from("date,top_buyer,acc_ratio\n");
    for b in bars {
        out.push_str(&format!("{},{},{}\n", b.date.format("%Y-%m-%d"), buyer, ratio));
    }
    out
}
