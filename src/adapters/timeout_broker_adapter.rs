//! Deadline-guarded wrapper around a broker feed.

use crate::domain::broker::BrokerSnapshot;
use crate::domain::error::IdxQuantError;
use crate::ports::broker_port::BrokerFlowPort;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Consecutive timeouts after which a ticker stops being queried.
pub const DEFAULT_TRIP_AFTER: u32 = 3;

/// Runs each lookup on a worker thread and waits at most `timeout`.
/// A late answer is reported as "no data"; the worker is left to finish
/// on its own and its result is dropped.
///
/// After `trip_after` timeouts in a row for one ticker, that ticker is
/// answered with "no data" straight away for the life of the feed.
pub struct TimeoutBrokerFeed {
    inner: Arc<dyn BrokerFlowPort + Send + Sync>,
    timeout: Duration,
    trip_after: u32,
    timeouts: Mutex<HashMap<String, u32>>,
}

impl TimeoutBrokerFeed {
    pub fn new(inner: Arc<dyn BrokerFlowPort + Send + Sync>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            trip_after: DEFAULT_TRIP_AFTER,
            timeouts: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_trip_after(mut self, trip_after: u32) -> Self {
        self.trip_after = trip_after.max(1);
        self
    }

    fn timeout_count(&self, ticker: &str) -> Result<u32, IdxQuantError> {
        let timeouts = self.timeouts.lock().map_err(|_| IdxQuantError::Data {
            reason: "broker timeout table lock poisoned".into(),
        })?;
        Ok(timeouts.get(ticker).copied().unwrap_or(0))
    }

    fn set_timeout_count(&self, ticker: &str, count: u32) -> Result<(), IdxQuantError> {
        let mut timeouts = self.timeouts.lock().map_err(|_| IdxQuantError::Data {
            reason: "broker timeout table lock poisoned".into(),
        })?;
        timeouts.insert(ticker.to_string(), count);
        Ok(())
    }
}

impl BrokerFlowPort for TimeoutBrokerFeed {
    fn snapshot(
        &self,
        ticker: &str,
        date: Option<NaiveDate>,
    ) -> Result<Option<BrokerSnapshot>, IdxQuantError> {
        if self.timeout_count(ticker)? >= self.trip_after {
            return Ok(None);
        }

        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let owned_ticker = ticker.to_string();
        thread::spawn(move || {
            let _ = tx.send(inner.snapshot(&owned_ticker, date));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => {
                self.set_timeout_count(ticker, 0)?;
                result
            }
            Err(RecvTimeoutError::Timeout) => {
                let count = self.timeout_count(ticker)? + 1;
                self.set_timeout_count(ticker, count)?;
                if count >= self.trip_after {
                    tracing::warn!(
                        ticker,
                        timeouts = count,
                        "broker feed unresponsive, using neutral flow for the rest of the run"
                    );
                } else {
                    tracing::warn!(
                        ticker,
                        ?date,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "broker lookup timed out"
                    );
                }
                Ok(None)
            }
            Err(RecvTimeoutError::Disconnected) => Err(IdxQuantError::Data {
                reason: format!("broker lookup for {ticker} aborted"),
            }),
        }
    }
}
