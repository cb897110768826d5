//! Single-snapshot broker feed.

use crate::domain::broker::BrokerSnapshot;
use crate::domain::error::IdxQuantError;
use crate::ports::broker_port::BrokerFlowPort;
use chrono::NaiveDate;

/// Answers every lookup, dated or not, with the same snapshot. Backs the
/// `static` broker source, where the latest flow stands in for all history.
#[derive(Debug, Clone)]
pub struct StaticBrokerFeed {
    snapshot: BrokerSnapshot,
}

impl StaticBrokerFeed {
    pub fn new(snapshot: BrokerSnapshot) -> Self {
        Self { snapshot }
    }

    /// Latest snapshot of `ticker` from `source`, neutral if it has none.
    pub fn latest_from(source: &dyn BrokerFlowPort, ticker: &str) -> Result<Self, IdxQuantError> {
        let snapshot = source
            .snapshot(ticker, None)?
            .unwrap_or_else(|| BrokerSnapshot::neutral(None));
        Ok(Self::new(snapshot))
    }

    pub fn current(&self) -> &BrokerSnapshot {
        &self.snapshot
    }
}

impl BrokerFlowPort for StaticBrokerFeed {
    fn snapshot(
        &self,
        _ticker: &str,
        _date: Option<NaiveDate>,
    ) -> Result<Option<BrokerSnapshot>, IdxQuantError> {
        Ok(Some(self.snapshot.clone()))
    }
}
